use crate::compute::JoinSpec;
use crate::config::{SuiteConfig, TableConfig, Workload};
use crate::engine::Engine;
use crate::errors::{BenchError, BenchResult};
use crate::io::{self, Fixture};
use crate::observability::RunRecord;
use crate::timing::{summarize, time_repeated, BenchmarkResult};
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{debug, info, Level};
use uuid::Uuid;

type Operation<'a> = Box<dyn FnMut() -> BenchResult<()> + 'a>;

struct NamedBenchmark<'a> {
    name: String,
    operation: Operation<'a>,
}

/// Named benchmarks run in the order they were registered, each repeated
/// the same number of times.
pub struct Suite<'a> {
    repeat: NonZeroUsize,
    benchmarks: Vec<NamedBenchmark<'a>>,
}

impl<'a> Suite<'a> {
    pub fn new(repeat: NonZeroUsize) -> Self {
        Self {
            repeat,
            benchmarks: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: FnMut() -> BenchResult<()> + 'a,
    {
        self.benchmarks.push(NamedBenchmark {
            name: name.into(),
            operation: Box::new(operation),
        });
    }

    pub fn names(&self) -> Vec<&str> {
        self.benchmarks.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Stops at the first failing benchmark; later ones never run.
    pub fn run(self) -> BenchResult<Vec<BenchmarkResult>> {
        let mut results = Vec::with_capacity(self.benchmarks.len());
        for mut benchmark in self.benchmarks {
            let result = time_repeated(&benchmark.name, &mut benchmark.operation, self.repeat)?;
            results.push(result);
        }
        Ok(results)
    }
}

/// Inputs shared by every registered workload.
struct Workbench<'a> {
    table: &'a Fixture,
    table_config: &'a TableConfig,
    join: Option<&'a JoinSpec>,
}

impl<'a> Workbench<'a> {
    fn register_count_lines(&self, suite: &mut Suite<'a>) {
        let table = self.table;
        let label = Workload::CountLines.label();
        suite.register(label, move || {
            let rows = io::count_lines(table.path())?;
            info!(rows, "{}", label);
            Ok(())
        });
    }

    fn register(
        &self,
        suite: &mut Suite<'a>,
        workload: Workload,
        engine: &'a dyn Engine,
    ) -> BenchResult<()> {
        let name = format!("{} [{}]", workload.label(), engine.name());
        let label = name.clone();
        let table = self.table;

        match workload {
            Workload::CountLines => self.register_count_lines(suite),
            Workload::Count => suite.register(name, move || {
                let rows = engine.count(table)?;
                info!(rows, "{}", label);
                Ok(())
            }),
            Workload::ColumnAverages => suite.register(name, move || {
                let means = engine.column_means(table)?;
                info!(?means, "{}", label);
                Ok(())
            }),
            Workload::UniqueValues => {
                let column = self.table_config.unique_column.as_str();
                suite.register(name, move || {
                    let count = engine.n_unique(table, column)?;
                    info!(column, count, "{}", label);
                    Ok(())
                })
            }
            Workload::UniqueRows => {
                let columns = self.table_config.unique_rows.as_slice();
                suite.register(name, move || {
                    let count = engine.n_unique_rows(table, columns)?;
                    info!(?columns, count, "{}", label);
                    Ok(())
                })
            }
            Workload::Join => {
                let spec = self.join.ok_or_else(|| {
                    BenchError::InvalidArgument("join workload without join fixtures".to_string())
                })?;
                suite.register(name, move || {
                    let summary = engine.join(spec)?;
                    info!(rows = summary.rows, mean_diff = ?summary.mean_diff, "{}", label);
                    Ok(())
                })
            }
        }
        Ok(())
    }
}

/// Run every configured workload, print the summary and return the results.
pub fn run_suite(config: &SuiteConfig, run_id: Uuid) -> BenchResult<Vec<BenchmarkResult>> {
    config.validate()?;

    let table = config.table_fixture();
    let join = config.join_spec();
    let engines = config.engines();
    let bench = Workbench {
        table: &table,
        table_config: &config.table,
        join: join.as_ref(),
    };

    let mut suite = Suite::new(config.repeat);
    for &workload in &config.workloads {
        if workload.uses_engine() {
            for engine in &engines {
                bench.register(&mut suite, workload, engine.as_ref())?;
            }
        } else {
            bench.register_count_lines(&mut suite);
        }
    }
    info!(
        "Running {} benchmarks, {} repeats each",
        suite.len(),
        config.repeat
    );
    debug!(benchmarks = ?suite.names(), "Registered benchmarks");

    let results = suite.run()?;

    println!("\n *** Summary:");
    println!("{}", summarize(&results));

    if tracing::enabled!(Level::DEBUG) {
        let mut record = RunRecord::new(run_id);
        record.add_fixture(table.path())?;
        if let Some(spec) = &join {
            if config.workloads.contains(&Workload::Join) {
                record.add_fixture(spec.left.path())?;
                record.add_fixture(spec.right.path())?;
            }
        }
        record.add_results(&results);
        let json = serde_json::to_string(&record).map_err(|e| BenchError::Unknown(e.into()))?;
        debug!(record = %json, "Run record");
    }

    Ok(results)
}

/// Load a suite file (or the built-in default suite) and run it.
pub fn execute_suite(path: Option<&Path>, run_id: Uuid) -> BenchResult<Vec<BenchmarkResult>> {
    let config = match path {
        Some(path) => {
            info!("Loading suite from {:?}", path);
            SuiteConfig::from_path(path)?
        }
        None => {
            info!("No suite file given, using the default suite");
            SuiteConfig::default()
        }
    };
    run_suite(&config, run_id)
}

use crate::compute::{self, JoinSpec, JoinSummary};
use crate::errors::{BenchError, BenchResult};
use crate::io::Fixture;
use polars::prelude::*;
use tracing::debug;

/// A dataframe backend the benchmarks are timed against.
///
/// Every call reads its fixtures from disk again, so a timed sample always
/// includes parsing.
pub trait Engine {
    fn name(&self) -> &str;

    fn count(&self, fixture: &Fixture) -> BenchResult<usize>;

    /// Mean of every fixture column, in schema order.
    fn column_means(&self, fixture: &Fixture) -> BenchResult<Vec<Option<f64>>>;

    fn n_unique(&self, fixture: &Fixture, column: &str) -> BenchResult<usize>;

    /// Number of distinct rows over `columns`.
    fn n_unique_rows(&self, fixture: &Fixture, columns: &[String]) -> BenchResult<usize>;

    fn join(&self, spec: &JoinSpec) -> BenchResult<JoinSummary>;
}

/// Materializes the whole fixture before computing anything.
#[derive(Debug, Default, Clone)]
pub struct EagerEngine;

impl Engine for EagerEngine {
    fn name(&self) -> &str {
        "eager"
    }

    fn count(&self, fixture: &Fixture) -> BenchResult<usize> {
        Ok(fixture.load()?.height())
    }

    fn column_means(&self, fixture: &Fixture) -> BenchResult<Vec<Option<f64>>> {
        let df = fixture.load()?;
        df.get_columns()
            .iter()
            .map(|column| -> BenchResult<Option<f64>> {
                Ok(column.as_materialized_series().mean())
            })
            .collect()
    }

    fn n_unique(&self, fixture: &Fixture, column: &str) -> BenchResult<usize> {
        let df = fixture.load()?;
        Ok(df.column(column)?.as_materialized_series().n_unique()?)
    }

    fn n_unique_rows(&self, fixture: &Fixture, columns: &[String]) -> BenchResult<usize> {
        let df = fixture.load()?;
        let counted = compute::distinct_rows_query(df.lazy(), columns).collect()?;
        compute::rows_from(&counted)
    }

    fn join(&self, spec: &JoinSpec) -> BenchResult<JoinSummary> {
        let left = spec.left.load()?;
        let right = spec.right.load()?;
        debug!("Loaded join inputs: {} x {} rows", left.height(), right.height());
        let joined = compute::join_query(left.lazy(), right.lazy(), spec).collect()?;
        compute::join_summary_from(&joined)
    }
}

/// Builds a query over a CSV scan and collects only the aggregate.
#[derive(Debug, Default, Clone)]
pub struct LazyEngine {
    streaming: bool,
}

impl LazyEngine {
    pub fn new(streaming: bool) -> Self {
        Self { streaming }
    }

    pub fn streaming(&self) -> bool {
        self.streaming
    }

    fn collect(&self, lf: LazyFrame) -> BenchResult<DataFrame> {
        lf.with_streaming(self.streaming)
            .collect()
            .map_err(BenchError::PolarsError)
    }
}

impl Engine for LazyEngine {
    fn name(&self) -> &str {
        if self.streaming {
            "lazy-streaming"
        } else {
            "lazy"
        }
    }

    fn count(&self, fixture: &Fixture) -> BenchResult<usize> {
        let counted = self.collect(compute::count_query(fixture.scan()?))?;
        compute::rows_from(&counted)
    }

    fn column_means(&self, fixture: &Fixture) -> BenchResult<Vec<Option<f64>>> {
        let columns = fixture.column_names();
        let means = self.collect(compute::means_query(fixture.scan()?, &columns))?;
        compute::means_from(&means, &columns)
    }

    fn n_unique(&self, fixture: &Fixture, column: &str) -> BenchResult<usize> {
        let counted = self.collect(compute::n_unique_query(fixture.scan()?, column))?;
        compute::n_unique_from(&counted)
    }

    fn n_unique_rows(&self, fixture: &Fixture, columns: &[String]) -> BenchResult<usize> {
        let counted = self.collect(compute::distinct_rows_query(fixture.scan()?, columns))?;
        compute::rows_from(&counted)
    }

    fn join(&self, spec: &JoinSpec) -> BenchResult<JoinSummary> {
        let joined = self.collect(compute::join_query(
            spec.left.scan()?,
            spec.right.scan()?,
            spec,
        ))?;
        compute::join_summary_from(&joined)
    }
}

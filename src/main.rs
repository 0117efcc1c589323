use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dfbench::generate::{self, TableShape};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Clone, ValueEnum, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "dfbench")]
#[command(version = "0.1.0")]
#[command(about = "Micro-benchmark harness for dataframe workloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity (Info -> Debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Silence all logs
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format (text or json)
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fixture of random integer and float columns
    Gen {
        #[arg(short, long, default_value = "test_01.csv")]
        output: PathBuf,

        #[arg(long, default_value_t = 1_000_000)]
        rows: usize,

        #[arg(long, default_value_t = 2)]
        int_columns: usize,

        #[arg(long, default_value_t = 2)]
        float_columns: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Generate a pair of fixtures sharing a key cube
    GenJoin {
        #[arg(long, default_value = "test_02_a.csv")]
        left: PathBuf,

        #[arg(long, default_value = "test_02_b.csv")]
        right: PathBuf,

        /// Number of sampled IDs per key dimension
        #[arg(long, value_delimiter = ',', default_value = "100,100,100")]
        dims: Vec<usize>,

        /// Float value columns appended to each side
        #[arg(long, default_value_t = 1)]
        float_columns: usize,

        /// Key cube seed; the two sides use seed + 1 and seed + 2
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Run the benchmark suite
    Run {
        /// Suite YAML file; the default suite is used when omitted
        #[arg(value_name = "SUITE_FILE")]
        suite: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // DFBENCH_LOG takes precedence over the CLI flags
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("DFBENCH_LOG")
        .from_env_lossy();

    let run_id = Uuid::new_v4();

    // Logs go to stderr; stdout carries progress lines and the summary.
    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_span_list(false)
                .with_current_span(false)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let _span = tracing::info_span!("root", run_id = %run_id).entered();

    match &cli.command {
        Commands::Gen {
            output,
            rows,
            int_columns,
            float_columns,
            seed,
        } => {
            let shape = TableShape::new(*rows, *int_columns, *float_columns);
            generate::generate(output, shape, *seed)?;
        }
        Commands::GenJoin {
            left,
            right,
            dims,
            float_columns,
            seed,
        } => {
            let cube = generate::generate_key_cube(dims, *seed)?;
            generate::generate_joinable(left, &cube, *float_columns, seed.wrapping_add(1))?;
            generate::generate_joinable(right, &cube, *float_columns, seed.wrapping_add(2))?;
        }
        Commands::Run { suite } => {
            dfbench::runner::execute_suite(suite.as_deref(), run_id)?;
        }
    }

    Ok(())
}

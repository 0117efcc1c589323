use miette::{Diagnostic, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code("DFBENCH-001"),
        help("Please check your suite YAML syntax and structure.")
    )]
    ConfigError(#[source] serde_yaml::Error, #[label("here")] Option<SourceSpan>),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code("DFBENCH-002"),
        help("Check file paths and permissions.")
    )]
    IoError(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    #[diagnostic(
        code("DFBENCH-003"),
        help("An error occurred within the dataframe engine. Check that the column layout matches the fixture.")
    )]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("Fixture not found: {0:?}")]
    #[diagnostic(
        code("DFBENCH-004"),
        help("Generate fixtures first with `dfbench gen` and `dfbench gen-join`.")
    )]
    FixtureNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code("DFBENCH-005"))]
    InvalidArgument(String),

    #[error("Operation failed: {0}")]
    #[diagnostic(
        code("DFBENCH-006"),
        help("The engine returned no value for an aggregate.")
    )]
    OperationError(String),

    #[error(transparent)]
    #[diagnostic(code("DFBENCH-000"))]
    Unknown(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

use crate::errors::{BenchError, BenchResult};
use crate::io::Fixture;
use polars::prelude::*;

const ROWS: &str = "rows";
const N_UNIQUE: &str = "n_unique";
const MEAN_DIFF: &str = "mean_diff";

/// Two fixtures sharing a composite key, each with one value column.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub left: Fixture,
    pub right: Fixture,
    pub keys: Vec<String>,
    pub left_value: String,
    pub right_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinSummary {
    pub rows: usize,
    /// Mean of `left_value - right_value`; `None` when nothing matched.
    pub mean_diff: Option<f64>,
}

pub fn count_query(lf: LazyFrame) -> LazyFrame {
    lf.select([len().cast(DataType::UInt64).alias(ROWS)])
}

pub fn means_query(lf: LazyFrame, columns: &[String]) -> LazyFrame {
    let exprs: Vec<Expr> = columns
        .iter()
        .map(|name| col(name).cast(DataType::Float64).mean())
        .collect();
    lf.select(exprs)
}

pub fn n_unique_query(lf: LazyFrame, column: &str) -> LazyFrame {
    lf.select([col(column).n_unique().cast(DataType::UInt64).alias(N_UNIQUE)])
}

pub fn distinct_rows_query(lf: LazyFrame, columns: &[String]) -> LazyFrame {
    let cols: Vec<Expr> = columns.iter().map(col).collect();
    count_query(lf.select(cols).unique(None, UniqueKeepStrategy::First))
}

pub fn join_query(left: LazyFrame, right: LazyFrame, spec: &JoinSpec) -> LazyFrame {
    let on: Vec<Expr> = spec.keys.iter().map(col).collect();
    left.join(right, on.clone(), on, JoinArgs::new(JoinType::Inner))
        .select([
            len().cast(DataType::UInt64).alias(ROWS),
            (col(&spec.left_value) - col(&spec.right_value))
                .mean()
                .alias(MEAN_DIFF),
        ])
}

pub fn rows_from(df: &DataFrame) -> BenchResult<usize> {
    scalar_u64(df, ROWS).map(|n| n as usize)
}

pub fn n_unique_from(df: &DataFrame) -> BenchResult<usize> {
    scalar_u64(df, N_UNIQUE).map(|n| n as usize)
}

pub fn means_from(df: &DataFrame, columns: &[String]) -> BenchResult<Vec<Option<f64>>> {
    columns
        .iter()
        .map(|name| -> BenchResult<Option<f64>> { Ok(df.column(name)?.f64()?.get(0)) })
        .collect()
}

pub fn join_summary_from(df: &DataFrame) -> BenchResult<JoinSummary> {
    Ok(JoinSummary {
        rows: rows_from(df)?,
        mean_diff: df.column(MEAN_DIFF)?.f64()?.get(0),
    })
}

fn scalar_u64(df: &DataFrame, name: &str) -> BenchResult<u64> {
    df.column(name)?
        .u64()?
        .get(0)
        .ok_or_else(|| BenchError::OperationError(format!("no value in column '{}'", name)))
}

use crate::compute::JoinSpec;
use crate::engine::{EagerEngine, Engine, LazyEngine};
use crate::errors::{BenchError, BenchResult};
use crate::io::Fixture;
use crate::timing::DEFAULT_REPEAT;
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

/// Benchmark suite description, loaded from YAML.
///
/// Every field has a default; an empty document describes the stock suite
/// over `test_01.csv` and the `test_02_a.csv`/`test_02_b.csv` join pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    pub repeat: NonZeroUsize,
    pub table: TableConfig,
    pub join: Option<JoinConfig>,
    pub backends: Vec<BackendConfig>,
    pub workloads: Vec<Workload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub path: String,
    pub int_columns: Vec<String>,
    pub float_columns: Vec<String>,
    /// Column counted by `unique_values`.
    pub unique_column: String,
    /// Columns whose distinct combinations `unique_rows` counts.
    pub unique_rows: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JoinConfig {
    pub left: JoinSide,
    pub right: JoinSide,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JoinSide {
    pub path: String,
    pub value_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum BackendConfig {
    Eager,
    Lazy {
        #[serde(default)]
        streaming: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    CountLines,
    Count,
    ColumnAverages,
    UniqueValues,
    UniqueRows,
    Join,
}

impl Workload {
    pub const ALL: [Workload; 6] = [
        Workload::CountLines,
        Workload::Count,
        Workload::ColumnAverages,
        Workload::UniqueValues,
        Workload::UniqueRows,
        Workload::Join,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Workload::CountLines => "Count (no parsing)",
            Workload::Count => "Count",
            Workload::ColumnAverages => "Column averages",
            Workload::UniqueValues => "Unique values 1",
            Workload::UniqueRows => "Unique values 2",
            Workload::Join => "Join",
        }
    }

    /// Whether the workload goes through a dataframe backend.
    pub fn uses_engine(&self) -> bool {
        !matches!(self, Workload::CountLines)
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
            table: TableConfig::default(),
            join: Some(JoinConfig::default()),
            backends: vec![BackendConfig::Eager, BackendConfig::Lazy { streaming: false }],
            workloads: Workload::ALL.to_vec(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            path: "test_01.csv".to_string(),
            int_columns: vec!["A".to_string(), "B".to_string()],
            float_columns: vec!["C".to_string(), "D".to_string()],
            unique_column: "C".to_string(),
            unique_rows: vec!["C".to_string(), "D".to_string()],
        }
    }
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            left: JoinSide {
                path: "test_02_a.csv".to_string(),
                value_column: "valA".to_string(),
            },
            right: JoinSide {
                path: "test_02_b.csv".to_string(),
                value_column: "valB".to_string(),
            },
            keys: vec!["K1".to_string(), "K2".to_string(), "K3".to_string()],
        }
    }
}

impl SuiteConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = fs::read_to_string(path).map_err(BenchError::IoError)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BenchResult<Self> {
        let config: SuiteConfig =
            serde_yaml::from_str(content).map_err(|e| BenchError::ConfigError(e, None))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        let table_columns: Vec<&String> = self
            .table
            .int_columns
            .iter()
            .chain(&self.table.float_columns)
            .collect();
        if table_columns.is_empty() {
            return Err(invalid("table needs at least one column"));
        }
        for (index, name) in table_columns.iter().enumerate() {
            if table_columns[..index].contains(name) {
                return Err(invalid(format!("table column '{}' is listed twice", name)));
            }
        }
        let uses = |workload: Workload| self.workloads.contains(&workload);

        if uses(Workload::UniqueValues) && !table_columns.contains(&&self.table.unique_column) {
            return Err(invalid(format!(
                "unique_column '{}' is not a table column",
                self.table.unique_column
            )));
        }
        if uses(Workload::UniqueRows) {
            if self.table.unique_rows.is_empty() {
                return Err(invalid("unique_rows needs at least one column"));
            }
            if let Some(name) = self
                .table
                .unique_rows
                .iter()
                .find(|name| !table_columns.contains(name))
            {
                return Err(invalid(format!(
                    "unique_rows column '{}' is not a table column",
                    name
                )));
            }
        }
        if uses(Workload::Join) {
            let join = self
                .join
                .as_ref()
                .ok_or_else(|| invalid("join workload requires a join section"))?;
            if join.keys.is_empty() {
                return Err(invalid("join needs at least one key column"));
            }
            if join.left.value_column == join.right.value_column {
                return Err(invalid("join value columns must have different names"));
            }
            for (index, key) in join.keys.iter().enumerate() {
                if join.keys[..index].contains(key) {
                    return Err(invalid(format!("join key '{}' is listed twice", key)));
                }
            }
            if join.keys.contains(&join.left.value_column)
                || join.keys.contains(&join.right.value_column)
            {
                return Err(invalid("join value column cannot also be a key"));
            }
        }
        if self.workloads.iter().any(Workload::uses_engine) && self.backends.is_empty() {
            return Err(invalid("at least one backend is required"));
        }
        Ok(())
    }

    pub fn table_fixture(&self) -> Fixture {
        Fixture::with_layout(
            &self.table.path,
            &self.table.int_columns,
            &self.table.float_columns,
        )
    }

    pub fn join_spec(&self) -> Option<JoinSpec> {
        self.join.as_ref().map(|join| JoinSpec {
            left: Fixture::with_layout(
                &join.left.path,
                &join.keys,
                std::slice::from_ref(&join.left.value_column),
            ),
            right: Fixture::with_layout(
                &join.right.path,
                &join.keys,
                std::slice::from_ref(&join.right.value_column),
            ),
            keys: join.keys.clone(),
            left_value: join.left.value_column.clone(),
            right_value: join.right.value_column.clone(),
        })
    }

    pub fn engines(&self) -> Vec<Box<dyn Engine>> {
        self.backends
            .iter()
            .map(|backend| -> Box<dyn Engine> {
                match backend {
                    BackendConfig::Eager => Box::new(EagerEngine),
                    BackendConfig::Lazy { streaming } => Box::new(LazyEngine::new(*streaming)),
                }
            })
            .collect()
    }
}

fn invalid(msg: impl std::fmt::Display) -> BenchError {
    BenchError::ConfigError(serde_yaml::Error::custom(msg), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default_suite() {
        let config = SuiteConfig::from_yaml("{}").unwrap();
        assert_eq!(config, SuiteConfig::default());
        assert_eq!(config.repeat.get(), 3);
        assert_eq!(config.workloads, Workload::ALL.to_vec());
        assert_eq!(config.table_fixture().column_names(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_deserialize_suite() {
        let yaml = r#"
repeat: 5
table:
  path: "data/t.csv"
  int_columns: ["x"]
  float_columns: ["y", "z"]
  unique_column: "y"
  unique_rows: ["x", "z"]
join:
  left: { path: "l.csv", value_column: "lv" }
  right: { path: "r.csv", value_column: "rv" }
  keys: ["k"]
backends:
  - engine: eager
  - engine: lazy
    streaming: true
workloads: [count, join]
"#;
        let config = SuiteConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.repeat.get(), 5);
        assert_eq!(config.table.path, "data/t.csv");
        assert_eq!(
            config.backends,
            vec![BackendConfig::Eager, BackendConfig::Lazy { streaming: true }]
        );
        assert_eq!(config.workloads, vec![Workload::Count, Workload::Join]);

        let names: Vec<String> = config.engines().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["eager", "lazy-streaming"]);

        let spec = config.join_spec().unwrap();
        assert_eq!(spec.left.column_names(), vec!["k", "lv"]);
        assert_eq!(spec.right.column_names(), vec!["k", "rv"]);
    }

    #[test]
    fn test_lazy_streaming_defaults_off() {
        let config = SuiteConfig::from_yaml("backends:\n  - engine: lazy\n").unwrap();
        assert_eq!(config.backends, vec![BackendConfig::Lazy { streaming: false }]);
    }

    #[test]
    fn test_zero_repeat_rejected() {
        let err = SuiteConfig::from_yaml("repeat: 0").unwrap_err();
        assert!(matches!(err, BenchError::ConfigError(_, _)));
    }

    #[test]
    fn test_unknown_workload_rejected() {
        let err = SuiteConfig::from_yaml("workloads: [sort]").unwrap_err();
        assert!(matches!(err, BenchError::ConfigError(_, _)));
    }

    #[test]
    fn test_join_workload_needs_join_section() {
        let err = SuiteConfig::from_yaml("join: null").unwrap_err();
        assert!(err.to_string().contains("join section"));

        let config = SuiteConfig::from_yaml("join: null\nworkloads: [count]").unwrap();
        assert!(config.join_spec().is_none());
    }

    #[test]
    fn test_unique_column_must_exist() {
        let err = SuiteConfig::from_yaml("table:\n  unique_column: Z\n").unwrap_err();
        assert!(err.to_string().contains("unique_column"));
    }

    #[test]
    fn test_duplicate_table_column_rejected() {
        let yaml = "table:\n  int_columns: [A, B]\n  float_columns: [A, D]\n  unique_column: A\n  unique_rows: [A, D]\n";
        let err = SuiteConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("'A' is listed twice"));

        let err = SuiteConfig::from_yaml("table:\n  int_columns: [A, A]\n").unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_join_value_columns_must_differ() {
        let yaml = r#"
join:
  left: { path: "l.csv", value_column: "v" }
  right: { path: "r.csv", value_column: "v" }
  keys: ["k"]
"#;
        let err = SuiteConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("different names"));
    }

    #[test]
    fn test_engine_workloads_need_backend() {
        assert!(SuiteConfig::from_yaml("backends: []").is_err());
        assert!(SuiteConfig::from_yaml("backends: []\nworkloads: [count_lines]").is_ok());
    }
}

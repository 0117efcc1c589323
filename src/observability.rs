use crate::timing::BenchmarkResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use uuid::Uuid;

/// Everything needed to tie a set of timings back to the fixtures they were
/// measured on.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub fixtures: Vec<FixtureStats>,
    pub results: Vec<ResultRecord>,
}

#[derive(Debug, Serialize)]
pub struct FixtureStats {
    pub path: String,
    pub hash: String, // SHA256 hex
    pub size_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct ResultRecord {
    pub name: String,
    pub samples_ms: Vec<f64>,
}

impl RunRecord {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            fixtures: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn add_fixture<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let size_bytes = file.metadata()?.len();
        self.fixtures.push(FixtureStats {
            path: path.display().to_string(),
            hash: sha256_hex(&mut file)?,
            size_bytes,
        });
        Ok(())
    }

    pub fn add_results(&mut self, results: &[BenchmarkResult]) {
        self.results.extend(results.iter().map(|result| ResultRecord {
            name: result.name().to_string(),
            samples_ms: result
                .samples()
                .iter()
                .map(|sample| sample.as_secs_f64() * 1e3)
                .collect(),
        }));
    }
}

/// SHA-256 of everything left to read from `reader`, as lowercase hex.
pub fn sha256_hex<R: io::Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

use crate::errors::{BenchError, BenchResult};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A headerless CSV fixture together with the schema it is read with.
///
/// Fixture files carry no column names, so the layout is supplied here and
/// handed to the CSV reader as an explicit schema.
#[derive(Debug, Clone)]
pub struct Fixture {
    path: PathBuf,
    schema: SchemaRef,
}

impl Fixture {
    pub fn new<P, I, S>(path: P, columns: I) -> Self
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (S, DataType)>,
        S: AsRef<str>,
    {
        let mut schema = Schema::default();
        for (name, dtype) in columns {
            schema.with_column(name.as_ref().into(), dtype);
        }
        Self {
            path: path.into(),
            schema: Arc::new(schema),
        }
    }

    /// Integer columns first, then float columns, matching the generator.
    pub fn with_layout<P: Into<PathBuf>>(
        path: P,
        int_columns: &[String],
        float_columns: &[String],
    ) -> Self {
        let columns = int_columns
            .iter()
            .map(|name| (name, DataType::Int64))
            .chain(float_columns.iter().map(|name| (name, DataType::Float64)));
        Self::new(path, columns)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter_names().map(|name| name.to_string()).collect()
    }

    pub fn ensure_exists(&self) -> BenchResult<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(BenchError::FixtureNotFound(self.path.clone()))
        }
    }

    /// Build a lazy scan over the fixture. An empty file scans as a
    /// zero-row frame with the declared schema.
    pub fn scan(&self) -> BenchResult<LazyFrame> {
        self.ensure_exists()?;
        LazyCsvReader::new(&self.path)
            .with_has_header(false)
            .with_raise_if_empty(false)
            .with_schema(Some(self.schema.clone()))
            .finish()
            .map_err(BenchError::PolarsError)
    }

    /// Parse the whole fixture into memory.
    pub fn load(&self) -> BenchResult<DataFrame> {
        self.scan()?.collect().map_err(BenchError::PolarsError)
    }
}

/// Count lines without parsing any field.
pub fn count_lines<P: AsRef<Path>>(path: P) -> BenchResult<usize> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(BenchError::FixtureNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Row-at-a-time writer for the fixture CSV format: comma-delimited, no
/// header, integer fields before float fields.
pub struct FixtureWriter<W: Write> {
    inner: W,
    rows: usize,
}

impl FixtureWriter<BufWriter<File>> {
    /// Truncates `path` if it already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let file = File::create(path).map_err(BenchError::IoError)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FixtureWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, rows: 0 }
    }

    pub fn write_row<I, F>(&mut self, ints: I, floats: F) -> BenchResult<()>
    where
        I: IntoIterator<Item = i64>,
        F: IntoIterator<Item = f64>,
    {
        let mut first = true;
        for value in ints {
            if !first {
                self.inner.write_all(b",")?;
            }
            write!(self.inner, "{value}")?;
            first = false;
        }
        for value in floats {
            if !first {
                self.inner.write_all(b",")?;
            }
            write!(self.inner, "{value}")?;
            first = false;
        }
        self.inner.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> BenchResult<usize> {
        self.inner.flush()?;
        Ok(self.rows)
    }
}

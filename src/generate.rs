//! Synthetic CSV fixtures.
//!
//! Every generator takes an explicit random generator (`*_with_rng`) so the
//! output depends only on the generator state handed in; the seed-based
//! wrappers build a fresh `StdRng` per call.

use crate::errors::{BenchError, BenchResult};
use crate::io::FixtureWriter;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

/// Range of the integer columns of a plain fixture.
pub const INT_VALUE_RANGE: Range<i64> = 0..100;

/// Range key cube IDs are sampled from.
pub const KEY_ID_RANGE: Range<i64> = 0..1_000_000;

const PROGRESS_STEP: usize = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    pub rows: usize,
    pub int_columns: usize,
    pub float_columns: usize,
}

impl TableShape {
    pub fn new(rows: usize, int_columns: usize, float_columns: usize) -> Self {
        Self {
            rows,
            int_columns,
            float_columns,
        }
    }

    pub fn width(&self) -> usize {
        self.int_columns + self.float_columns
    }
}

/// Write a fixture of uniform random integers and floats.
pub fn generate<P: AsRef<Path>>(path: P, shape: TableShape, seed: u64) -> BenchResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with_rng(path, shape, &mut rng)
}

pub fn generate_with_rng<P: AsRef<Path>, R: Rng>(
    path: P,
    shape: TableShape,
    rng: &mut R,
) -> BenchResult<()> {
    let path = path.as_ref();
    info!(
        "Generating {:?}: {} rows, {} int columns, {} float columns",
        path, shape.rows, shape.int_columns, shape.float_columns
    );

    let ints: Vec<Vec<i64>> = (0..shape.int_columns)
        .map(|_| sample_ints(rng, shape.rows, INT_VALUE_RANGE))
        .collect();
    let floats: Vec<Vec<f64>> = (0..shape.float_columns)
        .map(|_| sample_floats(rng, shape.rows))
        .collect();

    write_columns(path, &ints, &floats, 0..shape.rows)
}

/// Cartesian product of independently sampled ID sets, one per dimension.
///
/// IDs within one dimension may repeat; the product keeps every
/// combination, so a repeated ID yields repeated key tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCube {
    ids: Vec<Vec<i64>>,
    columns: Vec<Vec<i64>>,
    len: usize,
}

impl KeyCube {
    /// Build the product of `ids`, first dimension outermost.
    pub fn from_ids(ids: Vec<Vec<i64>>) -> BenchResult<Self> {
        if ids.is_empty() {
            return Err(BenchError::InvalidArgument(
                "key cube needs at least one dimension".to_string(),
            ));
        }
        let mut len: usize = 1;
        for (dim, set) in ids.iter().enumerate() {
            if set.is_empty() {
                return Err(BenchError::InvalidArgument(format!(
                    "key cube dimension {} has size 0",
                    dim
                )));
            }
            len = len.checked_mul(set.len()).ok_or_else(|| {
                BenchError::InvalidArgument("key cube size overflows usize".to_string())
            })?;
        }

        let mut columns = Vec::with_capacity(ids.len());
        let mut stride = len;
        for set in &ids {
            stride /= set.len();
            let column = (0..len).map(|row| set[(row / stride) % set.len()]).collect();
            columns.push(column);
        }

        Ok(Self { ids, columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: `from_ids` rejects empty dimensions.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimensions(&self) -> usize {
        self.ids.len()
    }

    /// The sampled ID set of each dimension.
    pub fn ids(&self) -> &[Vec<i64>] {
        &self.ids
    }

    /// Key columns, one per dimension, each `len()` long.
    pub fn columns(&self) -> &[Vec<i64>] {
        &self.columns
    }

    pub fn row(&self, index: usize) -> Vec<i64> {
        self.columns.iter().map(|column| column[index]).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<i64>> + '_ {
        (0..self.len).map(move |index| self.row(index))
    }
}

pub fn generate_key_cube(dimension_sizes: &[usize], seed: u64) -> BenchResult<KeyCube> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_key_cube_with_rng(dimension_sizes, &mut rng)
}

pub fn generate_key_cube_with_rng<R: Rng>(
    dimension_sizes: &[usize],
    rng: &mut R,
) -> BenchResult<KeyCube> {
    if let Some(dim) = dimension_sizes.iter().position(|&size| size == 0) {
        return Err(BenchError::InvalidArgument(format!(
            "key cube dimension {} has size 0",
            dim
        )));
    }
    let ids = dimension_sizes
        .iter()
        .map(|&size| sample_ints(rng, size, KEY_ID_RANGE))
        .collect();
    let cube = KeyCube::from_ids(ids)?;
    debug!(
        "Key cube with {} dimensions and {} rows",
        cube.dimensions(),
        cube.len()
    );
    Ok(cube)
}

/// Write one half of a joinable pair: cube keys, fresh float columns, rows
/// shuffled.
pub fn generate_joinable<P: AsRef<Path>>(
    path: P,
    key_cube: &KeyCube,
    float_columns: usize,
    seed: u64,
) -> BenchResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_joinable_with_rng(path, key_cube, float_columns, &mut rng)
}

pub fn generate_joinable_with_rng<P: AsRef<Path>, R: Rng>(
    path: P,
    key_cube: &KeyCube,
    float_columns: usize,
    rng: &mut R,
) -> BenchResult<()> {
    let path = path.as_ref();
    info!(
        "Generating joinable {:?}: {} rows, {} key columns, {} float columns",
        path,
        key_cube.len(),
        key_cube.dimensions(),
        float_columns
    );

    let floats: Vec<Vec<f64>> = (0..float_columns)
        .map(|_| sample_floats(rng, key_cube.len()))
        .collect();
    let mut order: Vec<usize> = (0..key_cube.len()).collect();
    order.shuffle(rng);

    write_columns(path, key_cube.columns(), &floats, order)
}

fn sample_ints<R: Rng>(rng: &mut R, n: usize, range: Range<i64>) -> Vec<i64> {
    (0..n).map(|_| rng.gen_range(range.clone())).collect()
}

fn sample_floats<R: Rng>(rng: &mut R, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen::<f64>()).collect()
}

fn write_columns<I>(path: &Path, ints: &[Vec<i64>], floats: &[Vec<f64>], order: I) -> BenchResult<()>
where
    I: IntoIterator<Item = usize>,
    I::IntoIter: ExactSizeIterator,
{
    let order = order.into_iter();
    let pb = ProgressBar::new(order.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40} {pos}/{len} rows")
            .map_err(|e| BenchError::Unknown(e.into()))?
            .progress_chars("#>-"),
    );

    let mut writer = FixtureWriter::create(path)?;
    for row in order {
        writer.write_row(
            ints.iter().map(|column| column[row]),
            floats.iter().map(|column| column[row]),
        )?;
        if writer.rows() % PROGRESS_STEP == 0 {
            pb.set_position(writer.rows() as u64);
        }
    }
    let written = writer.finish()?;
    pb.finish_and_clear();

    info!("Wrote {} rows to {:?}", written, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_generate_shape_and_ranges() -> BenchResult<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.csv");
        generate(&path, TableShape::new(200, 2, 3), 7)?;

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 200);
        for row in &rows {
            assert_eq!(row.len(), 5);
            for field in &row[..2] {
                let v: i64 = field.parse().unwrap();
                assert!(INT_VALUE_RANGE.contains(&v), "int out of range: {}", v);
            }
            for field in &row[2..] {
                let v: f64 = field.parse().unwrap();
                assert!((0.0..1.0).contains(&v), "float out of range: {}", v);
            }
        }
        Ok(())
    }

    #[test]
    fn test_generate_is_deterministic() -> BenchResult<()> {
        let dir = tempdir()?;
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        generate(&first, TableShape::new(5, 2, 2), 0)?;
        generate(&second, TableShape::new(5, 2, 2), 0)?;
        assert_eq!(fs::read(&first)?, fs::read(&second)?);

        generate(&second, TableShape::new(5, 2, 2), 1)?;
        assert_ne!(fs::read(&first)?, fs::read(&second)?);
        Ok(())
    }

    #[test]
    fn test_generate_overwrites_and_handles_empty() -> BenchResult<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.csv");
        fs::write(&path, "stale contents\n")?;

        generate(&path, TableShape::new(0, 2, 2), 0)?;
        assert_eq!(fs::read_to_string(&path)?, "");

        generate(&path, TableShape::new(3, 0, 0), 0)?;
        assert_eq!(fs::read_to_string(&path)?, "\n\n\n");
        Ok(())
    }

    #[test]
    fn test_generate_unwritable_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("t.csv");
        let err = generate(&path, TableShape::new(1, 1, 1), 0).unwrap_err();
        assert!(matches!(err, BenchError::IoError(_)));
    }

    #[test]
    fn test_key_cube_product_order() -> BenchResult<()> {
        let cube = KeyCube::from_ids(vec![vec![1, 2], vec![10, 20, 30]])?;
        assert_eq!(cube.len(), 6);
        assert_eq!(cube.dimensions(), 2);
        let rows: Vec<Vec<i64>> = cube.rows().collect();
        assert_eq!(
            rows,
            vec![
                vec![1, 10],
                vec![1, 20],
                vec![1, 30],
                vec![2, 10],
                vec![2, 20],
                vec![2, 30],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_key_cube_keeps_duplicate_ids() -> BenchResult<()> {
        let cube = KeyCube::from_ids(vec![vec![5, 5], vec![1]])?;
        assert_eq!(cube.len(), 2);
        assert_eq!(cube.row(0), cube.row(1));
        Ok(())
    }

    #[test]
    fn test_generate_key_cube_is_full_product() -> BenchResult<()> {
        let cube = generate_key_cube(&[3, 4, 5], 11)?;
        assert_eq!(cube.len(), 60);

        let ids = cube.ids();
        let expected: HashSet<Vec<i64>> = ids[0]
            .iter()
            .flat_map(|&a| {
                ids[1]
                    .iter()
                    .flat_map(move |&b| ids[2].iter().map(move |&c| vec![a, b, c]))
            })
            .collect();
        let actual: HashSet<Vec<i64>> = cube.rows().collect();
        assert_eq!(actual, expected);

        for row in cube.rows() {
            assert_eq!(row.len(), 3);
            assert!(row.iter().all(|id| KEY_ID_RANGE.contains(id)));
        }
        Ok(())
    }

    #[test]
    fn test_generate_key_cube_rejects_bad_dimensions() {
        assert!(matches!(
            generate_key_cube(&[], 0),
            Err(BenchError::InvalidArgument(_))
        ));
        assert!(matches!(
            generate_key_cube(&[3, 0, 2], 0),
            Err(BenchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_joinable_pair_shares_keys() -> BenchResult<()> {
        let dir = tempdir()?;
        let left = dir.path().join("a.csv");
        let right = dir.path().join("b.csv");
        let cube = generate_key_cube(&[10, 10, 10], 3)?;
        generate_joinable(&left, &cube, 1, 4)?;
        generate_joinable(&right, &cube, 1, 5)?;

        let keys = |path: &Path| -> Vec<Vec<String>> {
            read_rows(path)
                .into_iter()
                .map(|mut row| {
                    assert_eq!(row.len(), 4);
                    let value: f64 = row[3].parse().unwrap();
                    assert!((0.0..1.0).contains(&value));
                    row.truncate(3);
                    row
                })
                .collect()
        };
        let left_keys = keys(&left);
        let right_keys = keys(&right);
        assert_eq!(left_keys.len(), 1000);
        assert_ne!(left_keys, right_keys, "rows should be shuffled independently");

        let mut left_sorted = left_keys.clone();
        let mut right_sorted = right_keys.clone();
        left_sorted.sort();
        right_sorted.sort();
        assert_eq!(left_sorted, right_sorted);

        let mut cube_sorted: Vec<Vec<String>> = cube
            .rows()
            .map(|row| row.iter().map(|id| id.to_string()).collect())
            .collect();
        cube_sorted.sort();
        assert_eq!(left_sorted, cube_sorted);
        Ok(())
    }

    #[test]
    fn test_explicit_rng_threads_state() -> BenchResult<()> {
        let dir = tempdir()?;
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");

        let mut rng = StdRng::seed_from_u64(9);
        generate_with_rng(&first, TableShape::new(4, 1, 1), &mut rng)?;
        generate_with_rng(&second, TableShape::new(4, 1, 1), &mut rng)?;
        assert_ne!(fs::read(&first)?, fs::read(&second)?);

        let mut replay = StdRng::seed_from_u64(9);
        generate_with_rng(&second, TableShape::new(4, 1, 1), &mut replay)?;
        assert_eq!(fs::read(&first)?, fs::read(&second)?);
        Ok(())
    }
}

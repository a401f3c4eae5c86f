//! JSON side files: labels, tombstones, query intervals and blend weights,
//! delete lists and query results.

use crate::error::Result;
use crate::filter_types::LabelInterval;
use crate::index::params::validate_alpha;
use crate::storage::persistence::write_atomic;
use crate::tombstone::{TombstoneMask, TombstoneRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    write_atomic(path.as_ref(), &bytes)
}

/// Per-node labels, `[l0, l1, ...]`.
pub fn read_labels(path: impl AsRef<Path>) -> Result<Vec<u64>> {
    read_json(path)
}

pub fn write_labels(path: impl AsRef<Path>, labels: &[u64]) -> Result<()> {
    write_json(path, labels)
}

/// `{"valid":[1,0,...],"invalid_count":N}`, checked for consistency.
pub fn read_tombstones(path: impl AsRef<Path>) -> Result<TombstoneMask> {
    let record: TombstoneRecord = read_json(path)?;
    TombstoneMask::from_record(record)
}

pub fn write_tombstones(path: impl AsRef<Path>, mask: &TombstoneMask) -> Result<()> {
    write_json(path, &mask.to_record())
}

/// Per-query label intervals, `[[lo, hi], ...]`.
pub fn read_intervals(path: impl AsRef<Path>) -> Result<Vec<LabelInterval>> {
    read_json(path)
}

/// Per-query blend weights, each in `[0, 1]`.
pub fn read_alphas(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let alphas: Vec<f32> = read_json(path)?;
    for &alpha in &alphas {
        validate_alpha(alpha)?;
    }
    Ok(alphas)
}

/// Node ids, e.g. a delete list.
pub fn read_ids(path: impl AsRef<Path>) -> Result<Vec<u64>> {
    read_json(path)
}

/// One id list per query.
pub fn write_results(path: impl AsRef<Path>, results: &[Vec<u32>]) -> Result<()> {
    write_json(path, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;

    #[test]
    fn test_tombstone_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tombstones.json");
        let mut mask = TombstoneMask::new(3);
        mask.mark_deleted(1);
        write_tombstones(&path, &mask).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, r#"{"valid":[1,0,1],"invalid_count":1}"#);
        assert_eq!(read_tombstones(&path).unwrap(), mask);
    }

    #[test]
    fn test_intervals_and_alphas() {
        let dir = tempfile::tempdir().unwrap();
        let intervals = dir.path().join("intervals.json");
        std::fs::write(&intervals, "[[1, 5], [0, 0]]").unwrap();
        assert_eq!(
            read_intervals(&intervals).unwrap(),
            vec![LabelInterval::new(1, 5), LabelInterval::new(0, 0)]
        );

        let alphas = dir.path().join("alphas.json");
        std::fs::write(&alphas, "[0.0, 0.25, 1.0]").unwrap();
        assert_eq!(read_alphas(&alphas).unwrap(), vec![0.0, 0.25, 1.0]);
        std::fs::write(&alphas, "[0.5, 1.5]").unwrap();
        assert!(matches!(
            read_alphas(&alphas),
            Err(IndexError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_labels_and_results() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.json");
        write_labels(&labels, &[4, 8, 15]).unwrap();
        assert_eq!(read_labels(&labels).unwrap(), vec![4, 8, 15]);

        let results = dir.path().join("results.json");
        write_results(&results, &[vec![1, 2], vec![]]).unwrap();
        let back: Vec<Vec<u32>> = read_json(&results).unwrap();
        assert_eq!(back, vec![vec![1, 2], vec![]]);

        std::fs::write(&labels, "{not json").unwrap();
        assert!(matches!(read_labels(&labels), Err(IndexError::Json(_))));
    }
}

//! Raw vector files.
//!
//! Headerless sequence of little-endian records, each `u32 d` followed by `d`
//! f32 components. Every record repeats the same `d`. A paired file holds `2n`
//! records: the e-space vectors first, then the s-space vectors in the same
//! node order.

use crate::config::MAX_DIMENSION;
use crate::error::{IndexError, Result};
use crate::storage::persistence::write_atomic;
use crate::vector::VectorStore;
use std::fs;
use std::path::Path;

/// Parses a raw vector file image.
pub fn decode_vectors(bytes: &[u8]) -> Result<VectorStore> {
    if bytes.len() < 4 {
        return Err(IndexError::Malformed(format!(
            "vector file of {} bytes has no dimension word",
            bytes.len()
        )));
    }
    let d = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if d == 0 || d > MAX_DIMENSION {
        return Err(IndexError::Malformed(format!(
            "vector dimension {d} outside 1..={MAX_DIMENSION}"
        )));
    }
    let record = (d + 1) * 4;
    if bytes.len() % record != 0 {
        return Err(IndexError::Malformed(format!(
            "vector file size {} is not a multiple of the {record}-byte record",
            bytes.len()
        )));
    }

    let count = bytes.len() / record;
    let mut data = Vec::with_capacity(count * d);
    for (i, chunk) in bytes.chunks_exact(record).enumerate() {
        let lead = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        if lead != d {
            return Err(IndexError::Malformed(format!(
                "record {i} declares dimension {lead}, expected {d}"
            )));
        }
        data.extend(
            chunk[4..]
                .chunks_exact(4)
                .map(|w| f32::from_le_bytes([w[0], w[1], w[2], w[3]])),
        );
    }
    VectorStore::from_flat(d, data)
}

/// Serializes `store` as a raw vector file image.
pub fn encode_vectors(store: &VectorStore) -> Vec<u8> {
    let d = store.dimension();
    let mut out = Vec::with_capacity(store.len() * (d + 1) * 4);
    for row in store.as_flat().chunks_exact(d.max(1)) {
        out.extend_from_slice(&(d as u32).to_le_bytes());
        for x in row {
            out.extend_from_slice(&x.to_le_bytes());
        }
    }
    out
}

pub fn read_vectors(path: impl AsRef<Path>) -> Result<VectorStore> {
    let path = path.as_ref();
    let store = decode_vectors(&fs::read(path)?)?;
    tracing::debug!(
        path = %path.display(),
        vectors = store.len(),
        dimension = store.dimension(),
        "Read vectors"
    );
    Ok(store)
}

pub fn write_vectors(path: impl AsRef<Path>, store: &VectorStore) -> Result<()> {
    write_atomic(path.as_ref(), &encode_vectors(store))
}

/// Reads a paired file and splits it into `(e, s)` stores of equal length.
pub fn read_paired_vectors(path: impl AsRef<Path>) -> Result<(VectorStore, VectorStore)> {
    let all = read_vectors(path)?;
    if all.len() % 2 != 0 {
        return Err(IndexError::Malformed(format!(
            "paired vector file holds an odd number of records ({})",
            all.len()
        )));
    }
    let half = all.len() / 2;
    Ok((all.clone_range(0, half)?, all.clone_range(half, all.len())?))
}

/// Writes `e` then `s` as one paired file. Both halves share one dimension.
pub fn write_paired_vectors(path: impl AsRef<Path>, e: &VectorStore, s: &VectorStore) -> Result<()> {
    if e.dimension() != s.dimension() {
        return Err(IndexError::DimensionMismatch {
            expected: e.dimension(),
            actual: s.dimension(),
        });
    }
    if e.len() != s.len() {
        return Err(IndexError::LengthMismatch {
            what: "s-space vectors",
            expected: e.len(),
            actual: s.len(),
        });
    }
    let mut bytes = encode_vectors(e);
    bytes.extend_from_slice(&encode_vectors(s));
    write_atomic(path.as_ref(), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(x: u32) -> [u8; 4] {
        x.to_le_bytes()
    }

    #[test]
    fn test_decode_layout() {
        let mut bytes = Vec::new();
        for row in [[1.0f32, 2.0], [3.0, 4.0]] {
            bytes.extend_from_slice(&word(2));
            bytes.extend_from_slice(&row[0].to_le_bytes());
            bytes.extend_from_slice(&row[1].to_le_bytes());
        }
        let store = decode_vectors(&bytes).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1), &[3.0, 4.0]);
        assert_eq!(encode_vectors(&store), bytes);
    }

    #[test]
    fn test_rejects_partial_record() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&word(2));
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&word(2));
        assert!(matches!(decode_vectors(&bytes), Err(IndexError::Malformed(_))));
    }

    #[test]
    fn test_rejects_zero_dimension_and_mixed_records() {
        assert!(decode_vectors(&word(0)).is_err());
        assert!(decode_vectors(&[]).is_err());

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&word(1));
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&word(3));
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        assert!(matches!(decode_vectors(&bytes), Err(IndexError::Malformed(_))));
    }

    #[test]
    fn test_paired_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.fvecs");
        let e = VectorStore::from_rows(2, &[[0.0f32, 1.0], [2.0, 3.0]]).unwrap();
        let s = VectorStore::from_rows(2, &[[9.0f32, 8.0], [7.0, 6.0]]).unwrap();
        write_paired_vectors(&path, &e, &s).unwrap();
        let (e2, s2) = read_paired_vectors(&path).unwrap();
        assert_eq!(e2, e);
        assert_eq!(s2, s);

        let odd = dir.path().join("odd.fvecs");
        write_vectors(&odd, &VectorStore::from_rows(1, &[[1.0f32], [2.0], [3.0]]).unwrap()).unwrap();
        assert!(matches!(read_paired_vectors(&odd), Err(IndexError::Malformed(_))));
    }
}

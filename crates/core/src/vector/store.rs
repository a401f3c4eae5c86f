//! Dense vector store with squared-norm caching.
//!
//! Vectors are kept contiguously in a single arena (node id `i` occupies
//! `data[i * dim..(i + 1) * dim]`) with a parallel array of squared L2 norms,
//! so stored-vs-stored distances reduce to one dot product.

use crate::error::{IndexError, Result};
use crate::vector::distance::{dot, euclidean_sq};

/// Ordered, append-only collection of equal-dimension vectors. Index = node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorStore {
    dimension: usize,
    data: Vec<f32>,
    norms_sq: Vec<f32>,
}

impl VectorStore {
    /// Creates an empty store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            norms_sq: Vec::new(),
        }
    }

    /// Creates a store from a flat row-major buffer of `len * dimension` floats.
    pub fn from_flat(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(IndexError::Malformed("vector dimension must be > 0".into()));
        }
        if data.len() % dimension != 0 {
            return Err(IndexError::Malformed(format!(
                "flat buffer of {} floats is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        let norms_sq = data.chunks_exact(dimension).map(|v| dot(v, v)).collect();
        Ok(Self {
            dimension,
            data,
            norms_sq,
        })
    }

    /// Creates a store from individual rows, all of which must share one dimension.
    pub fn from_rows<R: AsRef<[f32]>>(dimension: usize, rows: &[R]) -> Result<Self> {
        let mut store = Self::new(dimension);
        for row in rows {
            store.push(row.as_ref())?;
        }
        Ok(store)
    }

    /// Number of stored vectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.norms_sq.len()
    }

    /// Returns `true` if no vector has been stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.norms_sq.is_empty()
    }

    /// Dimension shared by every vector in the store.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Row-major view of the whole arena.
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Appends a vector and returns its node id.
    pub fn push(&mut self, vector: &[f32]) -> Result<u32> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let id = self.len() as u32;
        self.data.extend_from_slice(vector);
        self.norms_sq.push(dot(vector, vector));
        Ok(id)
    }

    /// Borrow the vector of node `id`. O(1) slice into the arena.
    #[inline]
    pub fn get(&self, id: u32) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Cached squared L2 norm of node `id`.
    #[inline]
    pub fn norm_sq(&self, id: u32) -> f32 {
        self.norms_sq[id as usize]
    }

    /// Squared L2 distance between two stored vectors, via cached norms.
    #[inline]
    pub fn dist2(&self, a: u32, b: u32) -> f32 {
        if a == b {
            return 0.0;
        }
        let d = self.norm_sq(a) + self.norm_sq(b) - 2.0 * dot(self.get(a), self.get(b));
        // cancellation can push near-identical vectors slightly below zero
        d.max(0.0)
    }

    /// L2 distance between two stored vectors.
    #[inline]
    pub fn dist(&self, a: u32, b: u32) -> f32 {
        self.dist2(a, b).sqrt()
    }

    /// Squared L2 distance from a stored vector to an arbitrary query.
    #[inline]
    pub fn dist2_to(&self, id: u32, query: &[f32]) -> f32 {
        euclidean_sq(self.get(id), query)
    }

    /// L2 distance from a stored vector to an arbitrary query.
    #[inline]
    pub fn dist_to(&self, id: u32, query: &[f32]) -> f32 {
        self.dist2_to(id, query).sqrt()
    }

    /// Copies nodes `[start, end)` into a new store.
    pub fn clone_range(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(IndexError::Malformed(format!(
                "range {start}..{end} out of bounds for store of {} vectors",
                self.len()
            )));
        }
        Ok(Self {
            dimension: self.dimension,
            data: self.data[start * self.dimension..end * self.dimension].to_vec(),
            norms_sq: self.norms_sq[start..end].to_vec(),
        })
    }

    /// Appends every vector of `other` after the existing ones.
    /// Existing node ids keep their position.
    pub fn append(&mut self, other: &VectorStore) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if other.dimension != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }
        self.data.extend_from_slice(&other.data);
        self.norms_sq.extend_from_slice(&other.norms_sq);
        Ok(())
    }

    /// Appends a single vector copied from another store.
    pub fn append_from(&mut self, other: &VectorStore, id: u32) -> Result<u32> {
        if id as usize >= other.len() {
            return Err(IndexError::NodeOutOfRange {
                id: id as u64,
                len: other.len(),
            });
        }
        self.push(other.get(id))
    }
}

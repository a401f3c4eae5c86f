//! Distance kernels and the dual-space distance pair.
//!
//! All distances are Euclidean. Stored-vs-stored distances use cached norms
//! (see [`VectorStore::dist2`]); query distances use a direct difference so
//! that no norm has to be computed for the query.

use crate::vector::store::VectorStore;
use serde::{Deserialize, Serialize};

/// Dot product, accumulated in chunks of four to help auto-vectorization.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let chunks = a.len() / 4;
    for c in 0..chunks {
        let i = c * 4;
        acc[0] += a[i] * b[i];
        acc[1] += a[i + 1] * b[i + 1];
        acc[2] += a[i + 2] * b[i + 2];
        acc[3] += a[i + 3] * b[i + 3];
    }
    let mut sum = acc[0] + acc[1] + acc[2] + acc[3];
    for i in chunks * 4..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// Squared Euclidean distance.
#[inline]
pub fn euclidean_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// A node's two simultaneous distances `(d_e, d_s)` to some reference point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistancePair {
    pub e: f32,
    pub s: f32,
}

impl DistancePair {
    pub fn new(e: f32, s: f32) -> Self {
        Self { e, s }
    }

    /// Blended scalar score `alpha * e + (1 - alpha) * s`.
    #[inline]
    pub fn blend(&self, alpha: f32) -> f32 {
        alpha * self.e + (1.0 - alpha) * self.s
    }

    /// `true` when `self` is no worse than `other` in both coordinates.
    #[inline]
    pub fn dominates(&self, other: &DistancePair) -> bool {
        self.e <= other.e && self.s <= other.s
    }

    /// Lexicographic `(e, s)` ordering; NaN compares equal.
    #[inline]
    pub fn lex_cmp(&self, other: &DistancePair) -> std::cmp::Ordering {
        self.e
            .partial_cmp(&other.e)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                self.s
                    .partial_cmp(&other.s)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// Borrowed view over the e-space and s-space stores of one dataset.
#[derive(Debug, Clone, Copy)]
pub struct DualSpace<'a> {
    pub e: &'a VectorStore,
    pub s: &'a VectorStore,
}

impl<'a> DualSpace<'a> {
    pub fn new(e: &'a VectorStore, s: &'a VectorStore) -> Self {
        Self { e, s }
    }

    /// Number of nodes (both stores share it).
    #[inline]
    pub fn len(&self) -> usize {
        self.e.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.e.is_empty()
    }

    /// Distance pair between two stored nodes.
    #[inline]
    pub fn pair(&self, a: u32, b: u32) -> DistancePair {
        DistancePair::new(self.e.dist(a, b), self.s.dist(a, b))
    }

    /// Distance pair from a stored node to a query given in both spaces.
    #[inline]
    pub fn pair_to(&self, id: u32, query_e: &[f32], query_s: &[f32]) -> DistancePair {
        DistancePair::new(self.e.dist_to(id, query_e), self.s.dist_to(id, query_s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_with_remainder() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((dot(&a, &b) - 35.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_sq() {
        assert!((euclidean_sq(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_endpoints() {
        let p = DistancePair::new(2.0, 6.0);
        assert_eq!(p.blend(1.0), 2.0);
        assert_eq!(p.blend(0.0), 6.0);
        assert!((p.blend(0.25) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_dominates() {
        let a = DistancePair::new(1.0, 1.0);
        let b = DistancePair::new(1.0, 2.0);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(a.dominates(&a));
    }

    #[test]
    fn test_dual_space_pairs() {
        let e = VectorStore::from_rows(1, &[[0.0], [3.0]]).unwrap();
        let s = VectorStore::from_rows(2, &[[0.0, 0.0], [0.0, 2.0]]).unwrap();
        let space = DualSpace::new(&e, &s);
        let p = space.pair(0, 1);
        assert!((p.e - 3.0).abs() < 1e-5);
        assert!((p.s - 2.0).abs() < 1e-5);
        let q = space.pair_to(1, &[1.0], &[0.0, 0.0]);
        assert!((q.e - 2.0).abs() < 1e-5);
        assert!((q.s - 2.0).abs() < 1e-5);
    }
}

//! Blend-weight validity sets.
//!
//! An [`AlphaInterval`] records the blend weights `alpha ∈ [0, 1)` for which an
//! edge is still believed to be non-redundant. It is a sorted list of
//! disjoint, non-adjacent half-open [`AlphaRange`]s that only ever shrinks.

use crate::error::{IndexError, Result};
use crate::vector::DistancePair;
use serde::{Deserialize, Serialize};

/// Half-open range `[lo, hi)` of blend weights. Empty when `lo >= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaRange {
    pub lo: f32,
    pub hi: f32,
}

impl AlphaRange {
    /// Every blend weight.
    pub const FULL: AlphaRange = AlphaRange { lo: 0.0, hi: 1.0 };
    /// The degenerate range `[1, 1)`.
    pub const EMPTY: AlphaRange = AlphaRange { lo: 1.0, hi: 1.0 };

    pub fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.lo < self.hi)
    }

    /// Component-wise intersection `(max(lo), min(hi))`.
    #[inline]
    pub fn intersect(&self, other: &AlphaRange) -> AlphaRange {
        AlphaRange {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        }
    }

    #[inline]
    pub fn contains(&self, alpha: f32) -> bool {
        self.lo <= alpha && alpha < self.hi
    }
}

/// Range of `alpha` for which `a.blend(alpha) <= b.blend(alpha)`.
///
/// Returns [`AlphaRange::FULL`] when `a` dominates `b`, [`AlphaRange::EMPTY`]
/// when `b` strictly dominates `a`, and otherwise the side of the unique
/// crossing point `p` on which `a` scores lower.
pub fn alpha_dominance(a: DistancePair, b: DistancePair) -> AlphaRange {
    if a.e <= b.e && a.s <= b.s {
        return AlphaRange::FULL;
    }
    if a.e >= b.e && a.s >= b.s {
        return AlphaRange::EMPTY;
    }
    let de = a.e - b.e;
    let ds = a.s - b.s;
    // de and ds have strictly opposite signs here, so de - ds != 0 and p ∈ (0, 1)
    let p = -ds / (de - ds);
    if de > 0.0 {
        // a loses at the pure-e end
        AlphaRange::new(0.0, p)
    } else {
        AlphaRange::new(p, 1.0)
    }
}

/// Sorted, disjoint, non-adjacent set of [`AlphaRange`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaInterval {
    ranges: Vec<AlphaRange>,
}

impl Default for AlphaInterval {
    fn default() -> Self {
        Self::full()
    }
}

impl AlphaInterval {
    /// The initial state of every new edge: `[0, 1)`.
    pub fn full() -> Self {
        Self {
            ranges: vec![AlphaRange::FULL],
        }
    }

    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Builds an interval from decoded ranges, rejecting anything non-canonical.
    pub fn from_ranges(ranges: Vec<AlphaRange>) -> Result<Self> {
        let interval = Self { ranges };
        if !interval.is_canonical() {
            return Err(IndexError::Corrupt(format!(
                "alpha interval is not sorted, disjoint and within [0, 1]: {:?}",
                interval.ranges
            )));
        }
        Ok(interval)
    }

    /// Surviving ranges in ascending order.
    pub fn ranges(&self) -> &[AlphaRange] {
        &self.ranges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// `true` if `alpha` lies in a surviving range.
    pub fn contains(&self, alpha: f32) -> bool {
        let idx = self.ranges.partition_point(|r| r.hi <= alpha);
        self.ranges.get(idx).is_some_and(|r| r.contains(alpha))
    }

    /// Subtracts `[lo, hi)`. No-op when `lo >= hi`.
    pub fn remove(&mut self, lo: f32, hi: f32) {
        if !(lo < hi) {
            return;
        }
        let first = self.ranges.partition_point(|r| r.hi <= lo);
        let last = self.ranges.partition_point(|r| r.lo < hi);
        if first >= last {
            return;
        }
        let mut kept: Vec<AlphaRange> = Vec::with_capacity(2);
        let head = self.ranges[first];
        if head.lo < lo {
            kept.push(AlphaRange::new(head.lo, lo));
        }
        let tail = self.ranges[last - 1];
        if tail.hi > hi {
            kept.push(AlphaRange::new(hi, tail.hi));
        }
        self.ranges.splice(first..last, kept);
    }

    /// Subtracts an [`AlphaRange`].
    #[inline]
    pub fn remove_range(&mut self, range: AlphaRange) {
        self.remove(range.lo, range.hi);
    }

    /// Checks the sorted / disjoint / non-adjacent / non-empty-member invariant.
    pub fn is_canonical(&self) -> bool {
        let in_bounds = self
            .ranges
            .iter()
            .all(|r| r.lo >= 0.0 && r.hi <= 1.0 && r.lo < r.hi);
        in_bounds && self.ranges.windows(2).all(|w| w[0].hi < w[1].lo)
    }
}

//! Attribute filter used by queries.
//!
//! Only a single inclusive numeric interval over the per-node label is
//! supported. On disk an interval is the JSON pair `[lo, hi]`.

use serde::{Deserialize, Serialize};

/// Inclusive label interval `[lo, hi]`. Empty when `lo > hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct LabelInterval {
    pub lo: u64,
    pub hi: u64,
}

impl LabelInterval {
    /// Matches every label.
    pub const ALL: LabelInterval = LabelInterval {
        lo: 0,
        hi: u64::MAX,
    };

    pub fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, label: u64) -> bool {
        self.lo <= label && label <= self.hi
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }
}

impl Default for LabelInterval {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<(u64, u64)> for LabelInterval {
    fn from((lo, hi): (u64, u64)) -> Self {
        Self { lo, hi }
    }
}

impl From<LabelInterval> for (u64, u64) {
    fn from(interval: LabelInterval) -> Self {
        (interval.lo, interval.hi)
    }
}

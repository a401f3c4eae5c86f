//! Lazy deletion mask.
//!
//! Deleting a node only clears its bit; the node keeps its edges and stays on
//! traversal paths, it is just never returned as a result. The running count
//! of cleared bits is kept next to the mask and checked on load.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Per-node valid bits plus the number of deleted nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TombstoneMask {
    valid: Vec<bool>,
    invalid_count: usize,
}

/// On-disk JSON form: `{"valid":[1,0,...],"invalid_count":N}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TombstoneRecord {
    pub valid: Vec<u8>,
    pub invalid_count: usize,
}

impl TombstoneMask {
    /// Mask of `n` live nodes.
    pub fn new(n: usize) -> Self {
        Self {
            valid: vec![true; n],
            invalid_count: 0,
        }
    }

    /// Validates a decoded record: bits must be 0 or 1 and the stored count
    /// must equal the number of zero bits.
    pub fn from_record(record: TombstoneRecord) -> Result<Self> {
        let mut valid = Vec::with_capacity(record.valid.len());
        for (id, &bit) in record.valid.iter().enumerate() {
            match bit {
                0 => valid.push(false),
                1 => valid.push(true),
                other => {
                    return Err(IndexError::Corrupt(format!(
                        "tombstone bit for node {id} is {other}, expected 0 or 1"
                    )))
                }
            }
        }
        let counted = valid.iter().filter(|&&v| !v).count();
        if counted != record.invalid_count {
            return Err(IndexError::Corrupt(format!(
                "tombstone invalid_count is {} but {} nodes are marked deleted",
                record.invalid_count, counted
            )));
        }
        Ok(Self {
            valid,
            invalid_count: counted,
        })
    }

    pub fn to_record(&self) -> TombstoneRecord {
        TombstoneRecord {
            valid: self.valid.iter().map(|&v| v as u8).collect(),
            invalid_count: self.invalid_count,
        }
    }

    #[inline]
    pub fn is_valid(&self, id: u32) -> bool {
        self.valid.get(id as usize).copied().unwrap_or(false)
    }

    /// Clears the bit of `id`. Returns `true` if the node was live.
    ///
    /// Panics if `id` is out of range; use [`TombstoneMask::delete`] for
    /// untrusted ids.
    pub fn mark_deleted(&mut self, id: u32) -> bool {
        let slot = &mut self.valid[id as usize];
        if *slot {
            *slot = false;
            self.invalid_count += 1;
            true
        } else {
            false
        }
    }

    /// Deletes every id in `ids`, all of which are checked before any bit
    /// changes. Already-deleted ids are skipped. Returns how many nodes went
    /// from live to deleted.
    pub fn delete(&mut self, ids: &[u64]) -> Result<usize> {
        if let Some(&bad) = ids.iter().find(|&&id| id >= self.valid.len() as u64) {
            return Err(IndexError::NodeOutOfRange {
                id: bad,
                len: self.valid.len(),
            });
        }
        Ok(ids
            .iter()
            .filter(|&&id| self.mark_deleted(id as u32))
            .count())
    }

    /// Appends `additional` live nodes.
    pub fn grow(&mut self, additional: usize) {
        self.valid.resize(self.valid.len() + additional, true);
    }

    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    pub fn valid_count(&self) -> usize {
        self.valid.len() - self.invalid_count
    }
}

//! Generation-stamped visited marks for graph traversal.
//!
//! A stamp array the size of the graph replaces a `HashSet<u32>`; `reset()`
//! bumps the generation instead of clearing, so a worker can reuse one set
//! across many searches.

/// Visited marks over node ids. A node counts as visited when its stamp equals
/// the current generation; stamps are only zeroed when the generation wraps.
#[derive(Debug, Default)]
pub struct VisitedSet {
    stamps: Vec<u32>,
    generation: u32,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity],
            generation: 1,
        }
    }

    /// Forget every mark. O(1) except once per `u32::MAX` resets.
    pub fn reset(&mut self) {
        if self.generation == u32::MAX {
            self.stamps.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Grow to cover ids `< capacity`.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.stamps.len() {
            self.stamps.resize(capacity, 0);
        }
        if self.generation == 0 {
            self.generation = 1;
        }
    }

    /// Marks `id`; returns `true` if it was not visited before.
    #[inline]
    pub fn insert(&mut self, id: u32) -> bool {
        let slot = &mut self.stamps[id as usize];
        if *slot == self.generation {
            false
        } else {
            *slot = self.generation;
            true
        }
    }
}

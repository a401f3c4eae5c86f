//! Query-time traversal: filtered, tombstone-aware beam search and the
//! brute-force baseline.
//!
//! Nodes outside the label interval are never entered. Tombstoned nodes are
//! entered and expanded like any other (they keep the graph connected) but
//! are dropped from the returned answer.

use crate::filter_types::LabelInterval;
use crate::graph::{Graph, VisitedSet};
use crate::tombstone::TombstoneMask;
use crate::vector::DualSpace;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashSet};
use std::ops::AddAssign;

thread_local! {
    /// Per-thread visited marks, reused across queries on the same rayon worker.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::default());
}

/// Work counters returned with every search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Blended distance computations.
    pub distance_evaluations: u64,
    /// Beam members whose edge list was scanned.
    pub expansions: u64,
}

impl SearchStats {
    pub fn merge(&mut self, other: &SearchStats) {
        self.distance_evaluations += other.distance_evaluations;
        self.expansions += other.expansions;
    }
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

/// One query: a vector in each space, the blend weight and the label filter.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub e: &'a [f32],
    pub s: &'a [f32],
    pub alpha: f32,
    pub interval: LabelInterval,
}

impl Query<'_> {
    #[inline]
    fn score(&self, space: &DualSpace<'_>, id: u32) -> OrderedFloat<f32> {
        OrderedFloat(space.pair_to(id, self.e, self.s).blend(self.alpha))
    }
}

#[inline]
fn debug_check_lengths(space: &DualSpace<'_>, labels: &[u64], tombstones: &TombstoneMask) {
    debug_assert_eq!(labels.len(), space.len(), "one label per stored node");
    debug_assert_eq!(tombstones.len(), space.len(), "one tombstone bit per stored node");
}

#[derive(Debug, Clone, Copy)]
struct BeamEntry {
    dist: OrderedFloat<f32>,
    id: u32,
    expanded: bool,
}

impl BeamEntry {
    #[inline]
    fn key(&self) -> (OrderedFloat<f32>, u32) {
        (self.dist, self.id)
    }
}

/// Best-first search from `start` keeping at most `beam_size` entries ordered
/// by blended distance.
///
/// The start node is scored unconditionally; every other node is entered only
/// if its label lies in `query.interval`. Returns up to `k` ids, nearest first,
/// that are live and inside the interval.
#[allow(clippy::too_many_arguments)]
pub fn beam_search(
    graph: &Graph,
    space: DualSpace<'_>,
    labels: &[u64],
    tombstones: &TombstoneMask,
    query: &Query<'_>,
    start: u32,
    beam_size: usize,
    k: usize,
) -> (Vec<u32>, SearchStats) {
    debug_check_lengths(&space, labels, tombstones);
    debug_assert_eq!(graph.len(), space.len(), "one edge list per stored node");
    let mut stats = SearchStats::default();
    if (start as usize) >= graph.len() || beam_size == 0 || k == 0 {
        return (Vec::new(), stats);
    }

    let beam = SEARCH_VISITED.with(|cell| {
        let mut visited = cell.borrow_mut();
        visited.ensure_capacity(graph.len());
        visited.reset();

        let mut beam: Vec<BeamEntry> = Vec::with_capacity(beam_size + 1);
        beam.push(BeamEntry {
            dist: query.score(&space, start),
            id: start,
            expanded: false,
        });
        stats.distance_evaluations += 1;
        visited.insert(start);

        let mut cursor = 0;
        while cursor < beam.len() {
            if beam[cursor].expanded {
                cursor += 1;
                continue;
            }
            beam[cursor].expanded = true;
            stats.expansions += 1;
            let current = beam[cursor].id;
            let mut resume = cursor + 1;

            for edge in graph.edges(current) {
                let v = edge.target;
                if !visited.insert(v) {
                    continue;
                }
                if !query.interval.contains(labels[v as usize]) {
                    continue;
                }
                let entry = BeamEntry {
                    dist: query.score(&space, v),
                    id: v,
                    expanded: false,
                };
                stats.distance_evaluations += 1;
                if beam.len() >= beam_size {
                    if let Some(worst) = beam.last() {
                        if entry.key() >= worst.key() {
                            continue;
                        }
                    }
                }
                let pos = beam.partition_point(|b| b.key() < entry.key());
                beam.insert(pos, entry);
                if beam.len() > beam_size {
                    beam.pop();
                }
                resume = resume.min(pos);
            }
            cursor = resume;
        }
        beam
    });

    let results = beam
        .iter()
        .filter(|b| tombstones.is_valid(b.id) && query.interval.contains(labels[b.id as usize]))
        .take(k)
        .map(|b| b.id)
        .collect();
    (results, stats)
}

/// Exact top-`k` over every live node inside the interval.
pub fn linear_search(
    space: DualSpace<'_>,
    labels: &[u64],
    tombstones: &TombstoneMask,
    query: &Query<'_>,
    k: usize,
) -> (Vec<u32>, SearchStats) {
    debug_check_lengths(&space, labels, tombstones);
    let mut stats = SearchStats::default();
    if k == 0 {
        return (Vec::new(), stats);
    }
    let mut heap: BinaryHeap<(OrderedFloat<f32>, u32)> = BinaryHeap::with_capacity(k + 1);
    for id in 0..space.len() as u32 {
        if !tombstones.is_valid(id) || !query.interval.contains(labels[id as usize]) {
            continue;
        }
        stats.distance_evaluations += 1;
        heap.push((query.score(&space, id), id));
        if heap.len() > k {
            heap.pop();
        }
    }
    let results = heap.into_sorted_vec().into_iter().map(|(_, id)| id).collect();
    (results, stats)
}

/// Fraction of `truth` present in `found`. An empty `truth` counts as fully recalled.
pub fn recall_at_k(found: &[u32], truth: &[u32]) -> f32 {
    if truth.is_empty() {
        return 1.0;
    }
    let found: HashSet<u32> = found.iter().copied().collect();
    let hits = truth.iter().filter(|id| found.contains(id)).count();
    hits as f32 / truth.len() as f32
}

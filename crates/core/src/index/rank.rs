//! Label rank array.
//!
//! Nodes sorted by `(label, id)` give every node a distinct position. The
//! attribute-local phase draws its candidates from a window of that order, the
//! pruner only compares triples whose middle node sits between the other two,
//! and filtered queries locate their label range in it by binary search.

use crate::filter_types::LabelInterval;
use crate::index::pareto::Candidate;
use std::ops::Range;

/// Node order by label and its inverse mapping. Recomputed whenever the node set changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelRanks {
    order: Vec<u32>,
    rank: Vec<usize>,
}

impl LabelRanks {
    pub fn new(labels: &[u64]) -> Self {
        let mut order: Vec<u32> = (0..labels.len() as u32).collect();
        order.sort_by_key(|&id| (labels[id as usize], id));
        let mut rank = vec![0usize; labels.len()];
        for (pos, &id) in order.iter().enumerate() {
            rank[id as usize] = pos;
        }
        Self { order, rank }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node id → position in label order.
    pub fn ranks(&self) -> &[usize] {
        &self.rank
    }

    /// Position in label order → node id.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    #[inline]
    pub fn rank(&self, id: u32) -> usize {
        self.rank[id as usize]
    }

    /// Up to `half` nodes on each side of `id` in label order, excluding `id`.
    pub fn window(&self, id: u32, half: usize) -> impl Iterator<Item = u32> + '_ {
        let center = self.rank(id);
        let lo = center.saturating_sub(half);
        let hi = (center + half + 1).min(self.order.len());
        self.order[lo..hi]
            .iter()
            .copied()
            .filter(move |&v| v != id)
    }

    /// Orders candidates by rank distance to `source`, nearest first.
    /// Ties resolve by rank so the order is independent of input order.
    pub fn sort_by_rank_distance(&self, source: u32, candidates: &mut [Candidate]) {
        let center = self.rank(source);
        candidates.sort_by_key(|c| {
            let r = self.rank(c.id);
            (center.abs_diff(r), r)
        });
    }

    /// Positions in label order whose label lies in `interval`.
    pub fn interval_span(&self, labels: &[u64], interval: &LabelInterval) -> Range<usize> {
        let start = self
            .order
            .partition_point(|&id| labels[id as usize] < interval.lo);
        let end = self
            .order
            .partition_point(|&id| labels[id as usize] <= interval.hi);
        start..end.max(start)
    }
}

/// `true` when `rank[v]` lies strictly between `rank[i]` and `rank[u]`.
#[inline]
pub(crate) fn rank_between(ranks: &[usize], i: u32, v: u32, u: u32) -> bool {
    let (ri, rv, ru) = (ranks[i as usize], ranks[v as usize], ranks[u as usize]);
    (ri < rv && rv < ru) || (ru < rv && rv < ri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DistancePair;

    fn cand(id: u32) -> Candidate {
        Candidate {
            id,
            dist: DistancePair::default(),
        }
    }

    #[test]
    fn test_ranks_follow_labels_then_ids() {
        let labels = [30, 10, 20, 10];
        let r = LabelRanks::new(&labels);
        assert_eq!(r.order(), &[1, 3, 2, 0]);
        assert_eq!(r.ranks(), &[3, 0, 2, 1]);
    }

    #[test]
    fn test_window_excludes_self_and_clamps() {
        let labels: Vec<u64> = (0..10).collect();
        let r = LabelRanks::new(&labels);
        let w: Vec<u32> = r.window(5, 2).collect();
        assert_eq!(w, vec![3, 4, 6, 7]);
        let w: Vec<u32> = r.window(0, 3).collect();
        assert_eq!(w, vec![1, 2, 3]);
        let w: Vec<u32> = r.window(9, 20).collect();
        assert_eq!(w.len(), 9);
    }

    #[test]
    fn test_sort_by_rank_distance() {
        let labels: Vec<u64> = (0..8).collect();
        let r = LabelRanks::new(&labels);
        let mut c = vec![cand(0), cand(7), cand(5), cand(3), cand(4)];
        r.sort_by_rank_distance(4, &mut c);
        let ids: Vec<u32> = c.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![4, 3, 5, 7, 0]);
    }

    #[test]
    fn test_rank_between() {
        let ranks = [0, 1, 2, 3];
        assert!(rank_between(&ranks, 0, 1, 3));
        assert!(rank_between(&ranks, 3, 2, 0));
        assert!(!rank_between(&ranks, 0, 3, 2));
        assert!(!rank_between(&ranks, 0, 0, 2));
    }

    #[test]
    fn test_interval_span() {
        let labels = [5, 1, 9, 3, 7];
        let r = LabelRanks::new(&labels);
        let span = r.interval_span(&labels, &LabelInterval::new(3, 7));
        let ids: Vec<u32> = r.order()[span].to_vec();
        assert_eq!(ids, vec![3, 0, 4]);
        assert!(r.interval_span(&labels, &LabelInterval::new(10, 20)).is_empty());
        assert!(r.interval_span(&labels, &LabelInterval::new(8, 2)).is_empty());
    }
}

//! The index aggregate.
//!
//! [`DualIndex`] owns the arrays that must stay the same length (both vector
//! stores, the labels and the tombstone mask) together with the graph and the
//! label ranks derived from them. Mutation goes through `&mut self`, so a
//! query borrowing `&self` always sees one consistent state.

use crate::config::MAX_DIMENSION;
use crate::error::{IndexError, Result};
use crate::filter_types::LabelInterval;
use crate::graph::Graph;
use crate::index::build::build_graph;
use crate::index::insert::{insert_nodes, InsertStats};
use crate::index::params::{validate_alpha, BuildParams, QueryParams};
use crate::index::rank::LabelRanks;
use crate::index::search::{beam_search, linear_search, Query, SearchStats};
use crate::tombstone::TombstoneMask;
use crate::vector::{DualSpace, VectorStore};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;

/// Ids returned by one query and the work it took.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub ids: Vec<u32>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone)]
pub struct DualIndex {
    e: VectorStore,
    s: VectorStore,
    labels: Vec<u64>,
    tombstones: TombstoneMask,
    graph: Graph,
    ranks: LabelRanks,
}

impl DualIndex {
    /// Builds a fresh index; every node starts live.
    pub fn build(e: VectorStore, s: VectorStore, labels: Vec<u64>, params: &BuildParams) -> Result<Self> {
        check_dimension(&e)?;
        check_dimension(&s)?;
        check_same_len(e.len(), s.len(), labels.len())?;
        let ranks = LabelRanks::new(&labels);
        let graph = build_graph(DualSpace::new(&e, &s), &ranks, params)?;
        let tombstones = TombstoneMask::new(labels.len());
        Ok(Self {
            e,
            s,
            labels,
            tombstones,
            graph,
            ranks,
        })
    }

    /// Reassembles an index from loaded parts and checks that they agree.
    pub fn from_parts(
        e: VectorStore,
        s: VectorStore,
        labels: Vec<u64>,
        tombstones: TombstoneMask,
        graph: Graph,
    ) -> Result<Self> {
        let ranks = LabelRanks::new(&labels);
        let index = Self {
            e,
            s,
            labels,
            tombstones,
            graph,
            ranks,
        };
        index.validate()?;
        Ok(index)
    }

    /// Checks the lockstep lengths and the graph's structural invariants.
    pub fn validate(&self) -> Result<()> {
        check_dimension(&self.e)?;
        check_dimension(&self.s)?;
        check_same_len(self.e.len(), self.s.len(), self.labels.len())?;
        let n = self.e.len();
        if self.tombstones.len() != n {
            return Err(IndexError::LengthMismatch {
                what: "tombstone mask",
                expected: n,
                actual: self.tombstones.len(),
            });
        }
        if self.graph.len() != n {
            return Err(IndexError::LengthMismatch {
                what: "graph nodes",
                expected: n,
                actual: self.graph.len(),
            });
        }
        self.graph.validate().map_err(IndexError::Corrupt)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn e_store(&self) -> &VectorStore {
        &self.e
    }

    pub fn s_store(&self) -> &VectorStore {
        &self.s
    }

    pub fn space(&self) -> DualSpace<'_> {
        DualSpace::new(&self.e, &self.s)
    }

    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    pub fn tombstones(&self) -> &TombstoneMask {
        &self.tombstones
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn ranks(&self) -> &LabelRanks {
        &self.ranks
    }

    /// Appends new nodes and links them into the graph.
    ///
    /// Everything is checked before the first array grows. Returns the id
    /// range assigned to the new nodes.
    pub fn insert(
        &mut self,
        e: &VectorStore,
        s: &VectorStore,
        labels: &[u64],
        params: &BuildParams,
    ) -> Result<(Range<u32>, InsertStats)> {
        params.validate()?;
        check_same_len(e.len(), s.len(), labels.len())?;
        for (store, new) in [(&self.e, e), (&self.s, s)] {
            if new.dimension() != store.dimension() && !new.is_empty() {
                return Err(IndexError::DimensionMismatch {
                    expected: store.dimension(),
                    actual: new.dimension(),
                });
            }
        }
        let old_n = self.len();
        if old_n + labels.len() > u32::MAX as usize {
            return Err(IndexError::InvalidParameter(format!(
                "inserting {} nodes would exceed the u32 id space",
                labels.len()
            )));
        }

        self.e.append(e)?;
        self.s.append(s)?;
        self.labels.extend_from_slice(labels);
        self.tombstones.grow(labels.len());
        self.ranks = LabelRanks::new(&self.labels);
        let space = DualSpace::new(&self.e, &self.s);
        let stats = insert_nodes(&mut self.graph, space, &self.ranks, old_n, params)?;
        Ok((old_n as u32..self.len() as u32, stats))
    }

    /// Marks `ids` deleted. Returns how many were live before.
    pub fn delete(&mut self, ids: &[u64]) -> Result<usize> {
        let deleted = self.tombstones.delete(ids)?;
        if deleted < ids.len() {
            tracing::warn!(
                "{} ids in the delete list were already tombstoned",
                ids.len() - deleted
            );
        }
        tracing::info!(
            "Deleted {} of {} requested nodes ({} live, {} tombstoned)",
            deleted,
            ids.len(),
            self.tombstones.valid_count(),
            self.tombstones.invalid_count()
        );
        Ok(deleted)
    }

    /// Start node for a query filtered by `interval`: the node at the middle
    /// of the interval's span in label order, moved outward to the nearest
    /// live node when possible. `None` when no label lies in the interval.
    pub fn entry_point(&self, interval: &LabelInterval) -> Option<u32> {
        let span = self.ranks.interval_span(&self.labels, interval);
        if span.is_empty() {
            return None;
        }
        let order = self.ranks.order();
        let mid = span.start + span.len() / 2;
        for step in 0..span.len() {
            for pos in [mid.checked_add(step), mid.checked_sub(step)].into_iter().flatten() {
                if span.contains(&pos) && self.tombstones.is_valid(order[pos]) {
                    return Some(order[pos]);
                }
            }
        }
        Some(order[mid])
    }

    /// Filtered beam search from [`DualIndex::entry_point`].
    pub fn query(&self, query: &Query<'_>, params: &QueryParams) -> Result<SearchOutcome> {
        params.validate()?;
        self.check_query(query)?;
        let Some(start) = self.entry_point(&query.interval) else {
            tracing::debug!(
                lo = query.interval.lo,
                hi = query.interval.hi,
                "No label in query interval"
            );
            return Ok(SearchOutcome::default());
        };
        let (ids, stats) = beam_search(
            &self.graph,
            self.space(),
            &self.labels,
            &self.tombstones,
            query,
            start,
            params.beam_size,
            params.k,
        );
        Ok(SearchOutcome { ids, stats })
    }

    /// Exact answer by scanning every node.
    pub fn linear_query(&self, query: &Query<'_>, k: usize) -> Result<SearchOutcome> {
        self.check_query(query)?;
        let (ids, stats) = linear_search(self.space(), &self.labels, &self.tombstones, query, k);
        Ok(SearchOutcome { ids, stats })
    }

    /// Runs independent queries in parallel; results keep the input order.
    pub fn query_batch(&self, queries: &[Query<'_>], params: &QueryParams) -> Result<Vec<SearchOutcome>> {
        params.validate()?;
        queries.par_iter().map(|q| self.query(q, params)).collect()
    }

    fn check_query(&self, query: &Query<'_>) -> Result<()> {
        validate_alpha(query.alpha)?;
        if query.e.len() != self.e.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.e.dimension(),
                actual: query.e.len(),
            });
        }
        if query.s.len() != self.s.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.s.dimension(),
                actual: query.s.len(),
            });
        }
        Ok(())
    }
}

fn check_dimension(store: &VectorStore) -> Result<()> {
    if store.dimension() == 0 || store.dimension() > MAX_DIMENSION {
        return Err(IndexError::InvalidParameter(format!(
            "vector dimension must be in 1..={MAX_DIMENSION}, got {}",
            store.dimension()
        )));
    }
    Ok(())
}

fn check_same_len(e: usize, s: usize, labels: usize) -> Result<()> {
    if s != e {
        return Err(IndexError::LengthMismatch {
            what: "s-space vectors",
            expected: e,
            actual: s,
        });
    }
    if labels != e {
        return Err(IndexError::LengthMismatch {
            what: "labels",
            expected: e,
            actual: labels,
        });
    }
    Ok(())
}

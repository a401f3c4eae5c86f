//! Multi-objective candidate search.
//!
//! Explores the graph from a set of start nodes under both distance objectives
//! at once. After every expansion round the pool is cut back to its first `k`
//! points by peeling Pareto layers, so the surviving candidates are good in
//! `d_e`, in `d_s`, or in a balanced mix of the two, rather than only in one.

use crate::graph::{Graph, VisitedSet};
use crate::vector::{DistancePair, DualSpace};

/// A node together with its distance pair to the current reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: u32,
    pub dist: DistancePair,
}

/// The point distances are measured from.
#[derive(Debug, Clone, Copy)]
pub enum Reference<'q> {
    /// A stored node. It is never returned as its own candidate.
    Node(u32),
    /// An external query given in both spaces.
    Query { e: &'q [f32], s: &'q [f32] },
}

impl Reference<'_> {
    #[inline]
    fn pair(&self, space: &DualSpace<'_>, id: u32) -> DistancePair {
        match *self {
            Reference::Node(source) => space.pair(source, id),
            Reference::Query { e, s } => space.pair_to(id, e, s),
        }
    }
}

/// Reusable per-worker traversal state.
#[derive(Debug, Default)]
pub struct ParetoScratch {
    visited: VisitedSet,
    expanded: VisitedSet,
}

impl ParetoScratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            visited: VisitedSet::new(capacity),
            expanded: VisitedSet::new(capacity),
        }
    }

    fn prepare(&mut self, capacity: usize) {
        self.visited.ensure_capacity(capacity);
        self.expanded.ensure_capacity(capacity);
        self.visited.reset();
        self.expanded.reset();
    }
}

/// Strict left turn `a → b → c` in the `(e, s)` plane.
#[inline]
fn turns_left(a: &DistancePair, b: &DistancePair, c: &DistancePair) -> bool {
    (b.e - a.e) * (c.s - a.s) - (b.s - a.s) * (c.e - a.e) > 0.0
}

/// Splits off the lower-left convex chain of `pool` (sorted lexicographically).
/// Returns `(layer, rest)`; layer members are mutually non-dominated.
///
/// The hull is taken over the plain (non-squared) distances that edges and
/// queries use; squaring the axes would change which points lie on it.
fn peel_layer(pool: Vec<Candidate>) -> (Vec<Candidate>, Vec<Candidate>) {
    let mut chain: Vec<Candidate> = Vec::new();
    let mut rest: Vec<Candidate> = Vec::with_capacity(pool.len());
    for p in pool {
        while chain.len() >= 2
            && !turns_left(&chain[chain.len() - 2].dist, &chain[chain.len() - 1].dist, &p.dist)
        {
            if let Some(popped) = chain.pop() {
                rest.push(popped);
            }
        }
        chain.push(p);
    }
    // past the lowest d_s vertex the hull climbs again: those points are dominated
    let mut lowest = 0;
    for (i, c) in chain.iter().enumerate() {
        if c.dist.s < chain[lowest].dist.s {
            lowest = i;
        }
    }
    rest.extend(chain.drain(lowest + 1..));
    (chain, rest)
}

/// Keeps the first `k` points of `candidates` in Pareto-layer order.
///
/// Layers are peeled one after another (each sorted by ascending `d_e`) until
/// `k` points are collected or the pool runs out; the last layer is cut to fit.
pub fn find_pareto_layers(candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    let k = k.min(candidates.len());
    let mut result = Vec::with_capacity(k);
    let mut pool = candidates;
    while result.len() < k {
        pool.sort_by(|a, b| a.dist.lex_cmp(&b.dist).then_with(|| a.id.cmp(&b.id)));
        let (layer, rest) = peel_layer(pool);
        result.extend(layer);
        pool = rest;
    }
    result.truncate(k);
    result
}

/// Collects up to `k` candidates spread across the `(d_e, d_s)` frontier of
/// `reference`, reachable from `starts` through `graph`.
///
/// Every round expands the pool members that have not been expanded yet, adds
/// their unvisited neighbors, and reduces the pool with [`find_pareto_layers`].
/// The search ends when a round discovers no new node.
pub fn pareto_search(
    graph: &Graph,
    space: DualSpace<'_>,
    reference: Reference<'_>,
    starts: &[u32],
    k: usize,
    scratch: &mut ParetoScratch,
) -> Vec<Candidate> {
    scratch.prepare(graph.len());
    if let Reference::Node(source) = reference {
        scratch.visited.insert(source);
    }

    let mut pool: Vec<Candidate> = Vec::with_capacity(starts.len());
    for &id in starts {
        if scratch.visited.insert(id) {
            pool.push(Candidate {
                id,
                dist: reference.pair(&space, id),
            });
        }
    }

    loop {
        let mut discovered: Vec<Candidate> = Vec::new();
        for member in &pool {
            if !scratch.expanded.insert(member.id) {
                continue;
            }
            for edge in graph.edges(member.id) {
                if scratch.visited.insert(edge.target) {
                    discovered.push(Candidate {
                        id: edge.target,
                        dist: reference.pair(&space, edge.target),
                    });
                }
            }
        }
        if discovered.is_empty() {
            break;
        }
        pool.extend(discovered);
        pool = find_pareto_layers(pool, k);
    }

    if pool.len() > k {
        pool = find_pareto_layers(pool, k);
    }
    pool
}

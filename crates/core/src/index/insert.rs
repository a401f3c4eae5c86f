//! Incremental insertion.
//!
//! New nodes go through the same attribute-local and spatial-global phases as
//! a full build, restricted to the appended id range. Existing nodes that a new
//! node links to, but that do not link back, get their lists rebuilt so the new
//! node becomes reachable.

use crate::error::{IndexError, Result};
use crate::graph::{Edge, Graph};
use crate::index::build::{attribute_phase, check_lengths, spatial_phase};
use crate::index::params::BuildParams;
use crate::index::pareto::Candidate;
use crate::index::prune::prune;
use crate::index::rank::LabelRanks;
use crate::vector::DualSpace;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Outcome of one [`insert_nodes`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertStats {
    /// Nodes appended to the graph.
    pub inserted: usize,
    /// Existing neighbor lists that were rebuilt.
    pub repaired: usize,
}

/// Links the nodes `[old_n, space.len())` into `graph`, which must hold exactly
/// `old_n` nodes on entry.
///
/// `space` and `ranks` already cover the old and the new nodes.
pub fn insert_nodes(
    graph: &mut Graph,
    space: DualSpace<'_>,
    ranks: &LabelRanks,
    old_n: usize,
    params: &BuildParams,
) -> Result<InsertStats> {
    params.validate()?;
    check_lengths(space, ranks)?;
    if graph.len() != old_n {
        return Err(IndexError::LengthMismatch {
            what: "graph nodes",
            expected: old_n,
            actual: graph.len(),
        });
    }
    let n = space.len();
    if n < old_n {
        return Err(IndexError::LengthMismatch {
            what: "vectors after insertion",
            expected: old_n,
            actual: n,
        });
    }
    if n == old_n {
        return Ok(InsertStats::default());
    }

    let started = Instant::now();
    graph.resize(n);
    attribute_phase(graph, space, ranks, old_n..n, params);
    spatial_phase(graph, space, ranks, old_n..n, params);

    let mut repaired = 0;
    for i in old_n..n {
        let i = i as u32;
        let stale: Vec<u32> = graph
            .edges(i)
            .iter()
            .map(|e| e.target)
            .filter(|&u| !graph.has_edge(u, i))
            .collect();
        if stale.is_empty() {
            continue;
        }

        let snapshot: &Graph = graph;
        let rebuilt: Vec<(u32, Vec<Edge>)> = stale
            .par_iter()
            .map(|&u| (u, relink(snapshot, space, ranks, u, i, params.max_edges)))
            .collect();
        repaired += rebuilt.len();
        for (u, edges) in rebuilt {
            graph.set_edges(u, edges);
        }
    }

    tracing::info!(
        "Inserted {} nodes ({} total), relinked {} neighbors in {}ms",
        n - old_n,
        n,
        repaired,
        started.elapsed().as_millis()
    );
    Ok(InsertStats {
        inserted: n - old_n,
        repaired,
    })
}

/// Re-prunes `u`'s list from scratch with `i` added to its current neighbors.
fn relink(
    graph: &Graph,
    space: DualSpace<'_>,
    ranks: &LabelRanks,
    u: u32,
    i: u32,
    max_edges: usize,
) -> Vec<Edge> {
    let current = graph.edges(u);
    let mut candidates: Vec<Candidate> = Vec::with_capacity(current.len() + 1);
    candidates.extend(current.iter().map(|e| Candidate {
        id: e.target,
        dist: e.dist,
    }));
    candidates.push(Candidate {
        id: i,
        dist: space.pair(u, i),
    });
    ranks.sort_by_rank_distance(u, &mut candidates);

    let mut edges = Vec::with_capacity(max_edges.min(candidates.len()));
    prune(u, ranks.ranks(), &mut edges, space, &candidates, max_edges);
    edges
}

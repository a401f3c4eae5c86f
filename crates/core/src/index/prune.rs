//! Alpha-interval occlusion pruning.
//!
//! Relative-neighborhood pruning drops `i → u` when some accepted neighbor `v`
//! is closer to both `i` and `u` than they are to each other. Here distances
//! are blends of two spaces, so instead of a yes/no answer every candidate
//! keeps the sub-range of `alpha` for which no accepted neighbor shortcuts it;
//! a candidate whose range empties is dropped.

use crate::graph::{alpha_dominance, AlphaInterval, Edge};
use crate::index::pareto::Candidate;
use crate::index::rank::rank_between;
use crate::vector::DualSpace;

/// Appends the surviving `candidates` to `edges` (the current accepted list of `source`).
///
/// Candidates are taken in order while `edges.len() < max_edges`. A candidate is
/// compared only with accepted neighbors whose rank lies strictly between the
/// source's and the candidate's in `ranks`. Returns how many edges were added.
pub fn prune(
    source: u32,
    ranks: &[usize],
    edges: &mut Vec<Edge>,
    space: DualSpace<'_>,
    candidates: &[Candidate],
    max_edges: usize,
) -> usize {
    let before = edges.len();
    for cand in candidates {
        if edges.len() >= max_edges {
            break;
        }
        let u = cand.id;
        if u == source {
            continue;
        }
        let diu = cand.dist;
        let mut alpha = AlphaInterval::full();
        for accepted in edges.iter() {
            let v = accepted.target;
            if v == u {
                alpha.clear();
                break;
            }
            if !rank_between(ranks, source, v, u) {
                continue;
            }
            let duv = space.pair(u, v);
            let shortcut = alpha_dominance(accepted.dist, diu).intersect(&alpha_dominance(duv, diu));
            if shortcut.is_empty() {
                continue;
            }
            for range in accepted.alpha.ranges() {
                alpha.remove_range(shortcut.intersect(range));
            }
            if alpha.is_empty() {
                break;
            }
        }
        if !alpha.is_empty() {
            edges.push(Edge {
                target: u,
                dist: diu,
                alpha,
            });
        }
    }
    edges.len() - before
}

//! Parallel graph construction.
//!
//! Three passes over the node set, each a rayon map in which a node only
//! writes its own edge list:
//!
//! 1. attribute-local: neighbors in label order, so every label range stays
//!    internally connected for filtered queries;
//! 2. spatial-global: Pareto candidates found by searching the graph built so
//!    far from random seeds;
//! 3. reverse-edge repair: every forward edge offers its reverse to the target.

use crate::config::PROGRESS_LOG_INTERVAL;
use crate::error::{IndexError, Result};
use crate::graph::Graph;
use crate::index::params::BuildParams;
use crate::index::pareto::{pareto_search, Candidate, ParetoScratch, Reference};
use crate::index::prune::prune;
use crate::index::rank::LabelRanks;
use crate::vector::DualSpace;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Builds the graph over every node of `space`.
///
/// `ranks` must be computed from the labels of the same nodes.
pub fn build_graph(space: DualSpace<'_>, ranks: &LabelRanks, params: &BuildParams) -> Result<Graph> {
    params.validate()?;
    check_lengths(space, ranks)?;
    let n = space.len();
    let started = Instant::now();
    tracing::info!(
        "Building graph over {} nodes (ef_spatial={}, ef_attribute={}, max_edges={})",
        n,
        params.ef_spatial,
        params.ef_attribute,
        params.max_edges
    );

    let mut graph = Graph::new(n);
    attribute_phase(&mut graph, space, ranks, 0..n, params);
    spatial_phase(&mut graph, space, ranks, 0..n, params);
    reverse_edge_repair(&mut graph, space, ranks, params);

    tracing::info!(
        "Built graph: {} nodes, {} edges, max degree {} in {}ms",
        n,
        graph.edge_count(),
        graph.max_degree(),
        started.elapsed().as_millis()
    );
    Ok(graph)
}

pub(crate) fn check_lengths(space: DualSpace<'_>, ranks: &LabelRanks) -> Result<()> {
    if space.s.len() != space.e.len() {
        return Err(IndexError::LengthMismatch {
            what: "s-space vectors",
            expected: space.e.len(),
            actual: space.s.len(),
        });
    }
    if ranks.len() != space.len() {
        return Err(IndexError::LengthMismatch {
            what: "labels",
            expected: space.len(),
            actual: ranks.len(),
        });
    }
    Ok(())
}

/// Independent generator for the task that handles `node`.
fn task_rng(seed: u64, node: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (node as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn log_progress(counter: &AtomicUsize, total: usize, phase: &'static str) {
    let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
    if done % PROGRESS_LOG_INTERVAL == 0 {
        tracing::info!("{} phase: {}/{} nodes", phase, done, total);
    }
}

/// Connects each node in `nodes` to its label-order neighbors.
///
/// Takes `ef_attribute / 2` nodes on each side of the node's rank and prunes
/// them into a fresh edge list.
pub(crate) fn attribute_phase(
    graph: &mut Graph,
    space: DualSpace<'_>,
    ranks: &LabelRanks,
    nodes: Range<usize>,
    params: &BuildParams,
) {
    let half = params.ef_attribute / 2;
    let start = nodes.start;
    let total = nodes.len();
    let progress = AtomicUsize::new(0);

    graph.lists_mut()[nodes]
        .par_iter_mut()
        .enumerate()
        .for_each(|(offset, edges)| {
            let i = (start + offset) as u32;
            let mut candidates: Vec<Candidate> = ranks
                .window(i, half)
                .map(|v| Candidate {
                    id: v,
                    dist: space.pair(i, v),
                })
                .collect();
            ranks.sort_by_rank_distance(i, &mut candidates);
            edges.clear();
            prune(i, ranks.ranks(), edges, space, &candidates, params.max_edges);
            log_progress(&progress, total, "attribute-local");
        });
}

/// Adds spatially close nodes found by Pareto search over the current graph.
///
/// Candidate discovery for all of `nodes` reads the graph as it stood when the
/// phase began; edges are written afterwards.
pub(crate) fn spatial_phase(
    graph: &mut Graph,
    space: DualSpace<'_>,
    ranks: &LabelRanks,
    nodes: Range<usize>,
    params: &BuildParams,
) {
    let n = graph.len();
    if params.ef_spatial == 0 || n < 2 || nodes.is_empty() {
        return;
    }
    let start = nodes.start;
    let total = nodes.len();
    let progress = AtomicUsize::new(0);

    let snapshot: &Graph = graph;
    let found: Vec<Vec<Candidate>> = nodes
        .clone()
        .into_par_iter()
        .map_init(
            || ParetoScratch::new(n),
            |scratch, i| {
                let i = i as u32;
                let mut rng = task_rng(params.seed, i);
                let seeds: Vec<u32> = (0..params.ef_spatial)
                    .map(|_| rng.gen_range(0..n as u32))
                    .collect();
                let mut candidates = pareto_search(
                    snapshot,
                    space,
                    Reference::Node(i),
                    &seeds,
                    params.ef_spatial,
                    scratch,
                );
                ranks.sort_by_rank_distance(i, &mut candidates);
                candidates
            },
        )
        .collect();

    graph.lists_mut()[nodes]
        .par_iter_mut()
        .zip(found.into_par_iter())
        .enumerate()
        .for_each(|(offset, (edges, candidates))| {
            let i = (start + offset) as u32;
            let added = prune(i, ranks.ranks(), edges, space, &candidates, params.max_edges);
            tracing::debug!(node = i, candidates = candidates.len(), added, "Spatial edges");
            log_progress(&progress, total, "spatial-global");
        });
}

/// Offers every edge `i → u` back to `u` as the candidate `u → i`.
pub(crate) fn reverse_edge_repair(
    graph: &mut Graph,
    space: DualSpace<'_>,
    ranks: &LabelRanks,
    params: &BuildParams,
) {
    let n = graph.len();
    let buckets: Vec<Mutex<Vec<Candidate>>> = (0..n).map(|_| Mutex::new(Vec::new())).collect();

    graph.lists().par_iter().enumerate().for_each(|(i, edges)| {
        for edge in edges {
            buckets[edge.target as usize].lock().push(Candidate {
                id: i as u32,
                dist: edge.dist,
            });
        }
    });

    let progress = AtomicUsize::new(0);
    graph
        .lists_mut()
        .par_iter_mut()
        .zip(buckets.into_par_iter())
        .enumerate()
        .for_each(|(u, (edges, bucket))| {
            let u = u as u32;
            let mut candidates = bucket.into_inner();
            if !candidates.is_empty() {
                ranks.sort_by_rank_distance(u, &mut candidates);
                prune(u, ranks.ranks(), edges, space, &candidates, params.max_edges);
            }
            log_progress(&progress, n, "reverse-repair");
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::VectorStore;

    fn grid(n: usize) -> (VectorStore, VectorStore, Vec<u64>) {
        let mut rng = StdRng::seed_from_u64(7);
        let e: Vec<[f32; 3]> = (0..n)
            .map(|_| [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()])
            .collect();
        let s: Vec<[f32; 2]> = (0..n).map(|_| [rng.gen::<f32>(), rng.gen::<f32>()]).collect();
        let labels = (0..n as u64).map(|i| i % 17).collect();
        (
            VectorStore::from_rows(3, &e).unwrap(),
            VectorStore::from_rows(2, &s).unwrap(),
            labels,
        )
    }

    fn params() -> BuildParams {
        BuildParams {
            ef_spatial: 16,
            ef_attribute: 8,
            max_edges: 12,
            seed: 42,
        }
    }

    #[test]
    fn test_build_respects_structure() {
        let (e, s, labels) = grid(200);
        let space = DualSpace::new(&e, &s);
        let ranks = LabelRanks::new(&labels);
        let graph = build_graph(space, &ranks, &params()).unwrap();

        assert_eq!(graph.len(), 200);
        assert!(graph.max_degree() <= 12);
        assert!(graph.validate().is_ok());
        for id in 0..200u32 {
            assert!(!graph.edges(id).is_empty(), "node {id} has no edges");
            for edge in graph.edges(id) {
                assert!(edge.alpha.is_canonical());
                let expected = space.pair(id, edge.target);
                assert!((edge.dist.e - expected.e).abs() < 1e-5);
                assert!((edge.dist.s - expected.s).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_build_is_deterministic_for_seed() {
        let (e, s, labels) = grid(120);
        let space = DualSpace::new(&e, &s);
        let ranks = LabelRanks::new(&labels);
        let a = build_graph(space, &ranks, &params()).unwrap();
        let b = build_graph(space, &ranks, &params()).unwrap();
        assert_eq!(a.lists(), b.lists());
    }

    #[test]
    fn test_attribute_phase_links_label_neighbors() {
        let (e, s, labels) = grid(60);
        let space = DualSpace::new(&e, &s);
        let ranks = LabelRanks::new(&labels);
        let mut graph = Graph::new(60);
        attribute_phase(&mut graph, space, &ranks, 0..60, &params());
        // the nearest rank neighbor is never occluded: nothing lies strictly between
        for pos in 0..59 {
            let a = ranks.order()[pos];
            let b = ranks.order()[pos + 1];
            assert!(graph.has_edge(a, b), "{a} -> {b} missing");
            assert!(graph.has_edge(b, a), "{b} -> {a} missing");
        }
    }

    #[test]
    fn test_rejects_invalid_params_and_lengths() {
        let (e, s, labels) = grid(10);
        let space = DualSpace::new(&e, &s);
        let ranks = LabelRanks::new(&labels);
        let bad = BuildParams {
            max_edges: 0,
            ..params()
        };
        assert!(matches!(
            build_graph(space, &ranks, &bad),
            Err(IndexError::InvalidParameter(_))
        ));

        let short = LabelRanks::new(&labels[..5]);
        assert!(matches!(
            build_graph(space, &short, &params()),
            Err(IndexError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_tiny_inputs() {
        let e = VectorStore::from_rows(1, &[[0.0f32]]).unwrap();
        let s = VectorStore::from_rows(1, &[[0.0f32]]).unwrap();
        let ranks = LabelRanks::new(&[3]);
        let graph = build_graph(DualSpace::new(&e, &s), &ranks, &params()).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);

        let e = VectorStore::new(1);
        let s = VectorStore::new(1);
        let graph = build_graph(DualSpace::new(&e, &s), &LabelRanks::new(&[]), &params()).unwrap();
        assert!(graph.is_empty());
    }
}

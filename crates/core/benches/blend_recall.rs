//! Blend sweep benchmark on synthetic data.
//! Builds one index, then measures Recall@10 (against linear search) and QPS
//! for several blend weights and beam sizes, unfiltered and label-filtered.
//!
//! Usage: cargo bench --bench blend_recall

use dualvec_core::{BuildParams, DualIndex, LabelInterval, Query, QueryParams, VectorStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

const N: usize = 20_000;
const QUERIES: usize = 500;
const E_DIM: usize = 32;
const S_DIM: usize = 16;
const LABELS: u64 = 100;
const K: usize = 10;

fn random_store(rng: &mut StdRng, n: usize, dim: usize) -> VectorStore {
    let data: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    VectorStore::from_flat(dim, data).expect("dimension divides buffer")
}

fn main() {
    println!("=== Blend sweep: {N} nodes, e={E_DIM}d, s={S_DIM}d ===");
    println!();

    let mut rng = StdRng::seed_from_u64(2024);
    let e = random_store(&mut rng, N, E_DIM);
    let s = random_store(&mut rng, N, S_DIM);
    let labels: Vec<u64> = (0..N).map(|_| rng.gen_range(0..LABELS)).collect();
    let qe = random_store(&mut rng, QUERIES, E_DIM);
    let qs = random_store(&mut rng, QUERIES, S_DIM);
    let intervals: Vec<LabelInterval> = (0..QUERIES)
        .map(|_| {
            let lo = rng.gen_range(0..LABELS - 20);
            LabelInterval::new(lo, lo + 19)
        })
        .collect();

    println!("--- Index Construction ---");
    let params = BuildParams {
        ef_spatial: 64,
        ef_attribute: 32,
        max_edges: 32,
        seed: 7,
    };
    println!(
        "Config: ef_spatial={}, ef_attribute={}, max_edges={}",
        params.ef_spatial, params.ef_attribute, params.max_edges
    );
    let t0 = Instant::now();
    let index = DualIndex::build(e, s, labels, &params).expect("build");
    let build_time = t0.elapsed();
    println!(
        "  Build time: {:.2}s ({:.0} nodes/s)",
        build_time.as_secs_f64(),
        N as f64 / build_time.as_secs_f64()
    );
    println!(
        "  Edges: {} (max degree {})",
        index.graph().edge_count(),
        index.graph().max_degree()
    );

    for filtered in [false, true] {
        println!();
        println!(
            "--- {} ---",
            if filtered { "Filtered (20% label window)" } else { "Unfiltered" }
        );
        println!("  alpha | beam | Recall@10 |    QPS    | Avg dist evals");
        println!("  ------+------+-----------+-----------+---------------");

        for &alpha in &[0.0f32, 0.25, 0.5, 0.75, 1.0] {
            let queries: Vec<Query<'_>> = (0..QUERIES as u32)
                .map(|i| Query {
                    e: qe.get(i),
                    s: qs.get(i),
                    alpha,
                    interval: if filtered {
                        intervals[i as usize]
                    } else {
                        LabelInterval::ALL
                    },
                })
                .collect();
            let truth: Vec<Vec<u32>> = queries
                .iter()
                .map(|q| index.linear_query(q, K).expect("linear").ids)
                .collect();

            for &beam_size in &[32usize, 64, 128] {
                let qp = QueryParams {
                    beam_size,
                    k: K,
                    alpha,
                };
                let t0 = Instant::now();
                let mut total_recall = 0.0f64;
                let mut evals = 0u64;
                for (q, gt) in queries.iter().zip(&truth) {
                    let outcome = index.query(q, &qp).expect("query");
                    evals += outcome.stats.distance_evaluations;
                    total_recall += dualvec_core::recall_at_k(&outcome.ids, gt) as f64;
                }
                let elapsed = t0.elapsed();
                println!(
                    "  {:>5.2} | {:>4} | {:.4}    | {:>9.1} | {:.0}",
                    alpha,
                    beam_size,
                    total_recall / QUERIES as f64,
                    QUERIES as f64 / elapsed.as_secs_f64(),
                    evals as f64 / QUERIES as f64
                );
            }
        }
    }

    println!();
    println!("=== Benchmark complete ===");
}

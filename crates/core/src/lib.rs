//! # dualvec-core
//!
//! Approximate nearest-neighbor graph index over items that live in two
//! distance spaces at once. A query blends the two distances as
//! `alpha * d_e + (1 - alpha) * d_s` with `alpha` chosen per query; every edge
//! records the range of `alpha` for which it is non-redundant, so one graph
//! serves every blend.
//!
//! Queries can be restricted to an inclusive label interval and skip nodes
//! marked deleted in a tombstone mask. Nodes can be appended without a
//! rebuild.
//!
//! The crate has no async dependencies; construction and batched queries run
//! on the rayon global pool.

/// Compile-time defaults and input limits.
pub mod config;
/// Error type and result alias.
pub mod error;
/// Label interval used to filter queries.
pub mod filter_types;
/// Edges, alpha-validity intervals, adjacency arena and visited sets.
pub mod graph;
/// Construction, insertion, Pareto search, pruning and query traversal.
pub mod index;
/// Vector, graph and JSON side-file formats.
pub mod storage;
/// Lazy deletion mask.
pub mod tombstone;
/// Vector stores and the dual-space distance view.
pub mod vector;

pub use error::{IndexError, Result};
pub use filter_types::LabelInterval;
pub use graph::{alpha_dominance, AlphaInterval, AlphaRange, Edge, Graph, VisitedSet};
pub use index::{
    beam_search, build_graph, find_pareto_layers, insert_nodes, linear_search, pareto_search,
    prune, recall_at_k, BuildParams, Candidate, DualIndex, InsertStats, LabelRanks, Query,
    QueryParams, Reference, SearchOutcome, SearchStats,
};
pub use tombstone::{TombstoneMask, TombstoneRecord};
pub use vector::{DistancePair, DualSpace, VectorStore};

//! Index construction, maintenance and querying.
//!
//! Everything here works on borrowed [`DualSpace`](crate::vector::DualSpace)
//! views and a [`Graph`](crate::graph::Graph); [`DualIndex`] ties the pieces
//! together for callers that want one owned object.

/// Parallel three-phase graph construction.
pub mod build;
/// Owning aggregate over stores, labels, tombstones and graph.
pub mod dual;
/// Appending nodes to a built graph.
pub mod insert;
/// Build and query parameter structs.
pub mod params;
/// Bi-objective candidate search and Pareto-layer peeling.
pub mod pareto;
/// Alpha-interval occlusion pruning.
pub mod prune;
/// Label-order ranks.
pub mod rank;
/// Beam search, linear baseline and recall.
pub mod search;

pub use build::build_graph;
pub use dual::{DualIndex, SearchOutcome};
pub use insert::{insert_nodes, InsertStats};
pub use params::{validate_alpha, BuildParams, QueryParams};
pub use pareto::{find_pareto_layers, pareto_search, Candidate, ParetoScratch, Reference};
pub use prune::prune;
pub use rank::LabelRanks;
pub use search::{beam_search, linear_search, recall_at_k, Query, SearchStats};

//! Graph structure: alpha-validity intervals, edges, and the node-indexed adjacency arena.
//!
//! Edges are owned by their source node's list inside [`Graph`]; nothing holds
//! references into the arena across a resize, so growth during insertion only
//! needs exclusive access to the graph.

/// Node-indexed arena of edge lists.
pub mod adjacency;
/// Directed edge with cached distance pair and validity interval.
pub mod edge;
/// Blend-weight ranges, interval sets and the dominance-range computation.
pub mod interval;
/// Generation-stamped visited marks for traversals.
pub mod visited;

pub use adjacency::Graph;
pub use edge::Edge;
pub use interval::{alpha_dominance, AlphaInterval, AlphaRange};
pub use visited::VisitedSet;

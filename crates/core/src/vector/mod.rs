//! Vector storage for the two parallel distance spaces.
//!
//! Every node owns one vector in the e-space and one in the s-space. The two
//! [`VectorStore`]s always have the same length; [`DualSpace`] borrows both
//! and produces the `(d_e, d_s)` pairs that the Pareto search, the pruner and
//! the query engine operate on.

/// Distance helpers and the `(d_e, d_s)` pair type.
pub mod distance;
/// Flat f32 arena with cached squared norms.
pub mod store;

pub use distance::{DistancePair, DualSpace};
pub use store::VectorStore;

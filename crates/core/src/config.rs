//! Global configuration constants for dualvec.
//!
//! All tuning defaults and input validation limits are defined here.
//! These are compile-time constants; runtime configuration is supplied through
//! [`BuildParams`](crate::index::BuildParams) and [`QueryParams`](crate::index::QueryParams),
//! which the CLI fills from JSON workflow files.

/// Default number of Pareto candidates gathered per node in the spatial-global phase.
///
/// Also the number of random seeds the candidate search starts from.
/// Higher values improve recall at the cost of build time. Typical range: 32–256.
pub const DEFAULT_EF_SPATIAL: usize = 64;

/// Default width of the label-rank window scanned in the attribute-local phase.
///
/// Half of the window is taken on each side of the node in label order.
pub const DEFAULT_EF_ATTRIBUTE: usize = 32;

/// Default maximum out-degree of a node.
pub const DEFAULT_MAX_EDGES: usize = 32;

/// Default beam capacity during query-time traversal.
pub const DEFAULT_BEAM_SIZE: usize = 64;

/// Default number of results per query.
pub const DEFAULT_K: usize = 10;

/// Default blend weight: `alpha * d_e + (1 - alpha) * d_s`.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Default seed for the per-task random generators used during construction.
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Number of processed nodes between two progress log lines.
pub const PROGRESS_LOG_INTERVAL: usize = 1_000;

/// Maximum allowed vector dimension in either space.
pub const MAX_DIMENSION: usize = 65_536;

/// Maximum number of results (`k`) per query.
pub const MAX_K: usize = 10_000;

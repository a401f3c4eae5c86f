//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised while loading, building, mutating or querying an index.
///
/// Malformed input and corrupt files abort the whole operation; degenerate
/// geometry and empty result sets are never reported here.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON record (labels, tombstones, intervals, configs) failed to parse or serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input data does not follow the expected layout.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A persisted file failed integrity checks on load.
    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// Parallel arrays that must grow in lockstep disagree in length.
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A vector does not match the dimension of the store it is added to.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A node id outside `[0, len)`.
    #[error("node {id} out of range (node count {len})")]
    NodeOutOfRange { id: u64, len: usize },

    /// A tuning parameter outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IndexError>;

//! Build and query parameters.
//!
//! Both structs deserialize from JSON with every field optional, falling back
//! to the defaults in [`crate::config`].

use crate::config;
use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Parameters for graph construction and incremental insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParams {
    /// Candidates (and random seeds) per node in the spatial-global phase.
    pub ef_spatial: usize,
    /// Label-rank window width of the attribute-local phase (half on each side).
    pub ef_attribute: usize,
    /// Maximum out-degree.
    pub max_edges: usize,
    /// Seed for the per-task random generators.
    pub seed: u64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            ef_spatial: config::DEFAULT_EF_SPATIAL,
            ef_attribute: config::DEFAULT_EF_ATTRIBUTE,
            max_edges: config::DEFAULT_MAX_EDGES,
            seed: config::DEFAULT_SEED,
        }
    }
}

impl BuildParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_edges == 0 {
            return Err(IndexError::InvalidParameter("max_edges must be > 0".into()));
        }
        if self.ef_spatial == 0 && self.ef_attribute < 2 {
            return Err(IndexError::InvalidParameter(
                "ef_spatial and ef_attribute leave no candidates to connect".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters for query-time traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Beam capacity.
    pub beam_size: usize,
    /// Number of results.
    pub k: usize,
    /// Blend weight used when a query does not carry its own.
    pub alpha: f32,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            beam_size: config::DEFAULT_BEAM_SIZE,
            k: config::DEFAULT_K,
            alpha: config::DEFAULT_ALPHA,
        }
    }
}

impl QueryParams {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > config::MAX_K {
            return Err(IndexError::InvalidParameter(format!(
                "k must be in 1..={}, got {}",
                config::MAX_K,
                self.k
            )));
        }
        if self.beam_size == 0 {
            return Err(IndexError::InvalidParameter("beam_size must be > 0".into()));
        }
        validate_alpha(self.alpha)
    }
}

/// Rejects blend weights outside `[0, 1]` (and NaN).
pub fn validate_alpha(alpha: f32) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(IndexError::InvalidParameter(format!(
            "alpha must be in [0, 1], got {alpha}"
        )))
    }
}

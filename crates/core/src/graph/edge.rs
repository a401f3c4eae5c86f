use crate::graph::interval::AlphaInterval;
use crate::vector::DistancePair;

/// Directed edge `source → target`.
///
/// `dist` caches the target's `(d_e, d_s)` relative to the source at creation
/// time; `alpha` is the set of blend weights for which no accepted sibling
/// occludes this edge. A stored edge never has an empty `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub target: u32,
    pub dist: DistancePair,
    pub alpha: AlphaInterval,
}

impl Edge {
    /// New edge valid for every blend weight.
    pub fn new(target: u32, dist: DistancePair) -> Self {
        Self {
            target,
            dist,
            alpha: AlphaInterval::full(),
        }
    }
}

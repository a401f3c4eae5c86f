//! Adjacency arena.
//!
//! [`Graph`] is a flat `Vec` of per-node edge lists indexed by node id. Parallel
//! construction hands out disjoint `&mut` lists through [`Graph::lists_mut`],
//! which is what lets rayon workers write their own node without locking.

use crate::graph::edge::Edge;

/// Directed graph over node ids `[0, len)`. Not required to be symmetric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    adjacency: Vec<Vec<Edge>>,
}

impl Graph {
    /// Creates a graph of `n` nodes with no edges.
    pub fn new(n: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n],
        }
    }

    /// Wraps already-built edge lists.
    pub fn from_lists(adjacency: Vec<Vec<Edge>>) -> Self {
        Self { adjacency }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Outgoing edges of `id`.
    #[inline]
    pub fn edges(&self, id: u32) -> &[Edge] {
        &self.adjacency[id as usize]
    }

    /// Replaces the edge list of `id`.
    pub fn set_edges(&mut self, id: u32, edges: Vec<Edge>) {
        self.adjacency[id as usize] = edges;
    }

    /// All edge lists, for disjoint parallel mutation.
    pub fn lists_mut(&mut self) -> &mut [Vec<Edge>] {
        &mut self.adjacency
    }

    /// All edge lists, indexed by node id.
    pub fn lists(&self) -> &[Vec<Edge>] {
        &self.adjacency
    }

    /// Grows (or shrinks) the node range; new nodes start without edges.
    pub fn resize(&mut self, n: usize) {
        self.adjacency.resize_with(n, Vec::new);
    }

    /// `true` if `from` has an edge to `to`.
    pub fn has_edge(&self, from: u32, to: u32) -> bool {
        self.edges(from).iter().any(|e| e.target == to)
    }

    /// Total number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Largest out-degree.
    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Checks that every target is in range, no node links to itself or twice
    /// to the same target, and no edge has an empty validity interval.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.len();
        for (id, list) in self.adjacency.iter().enumerate() {
            for (pos, edge) in list.iter().enumerate() {
                if edge.target as usize >= n {
                    return Err(format!(
                        "edge {} of node {} targets {} (node count {})",
                        pos, id, edge.target, n
                    ));
                }
                if edge.target as usize == id {
                    return Err(format!("node {} has a self-loop", id));
                }
                if edge.alpha.is_empty() {
                    return Err(format!(
                        "edge {} -> {} has an empty alpha interval",
                        id, edge.target
                    ));
                }
                if list[..pos].iter().any(|e| e.target == edge.target) {
                    return Err(format!("node {} links to {} twice", id, edge.target));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DistancePair;

    fn edge(to: u32) -> Edge {
        Edge::new(to, DistancePair::new(1.0, 1.0))
    }

    #[test]
    fn test_new_and_resize() {
        let mut g = Graph::new(3);
        assert_eq!(g.len(), 3);
        g.set_edges(0, vec![edge(1)]);
        g.resize(5);
        assert_eq!(g.len(), 5);
        assert_eq!(g.edges(0).len(), 1);
        assert!(g.edges(4).is_empty());
    }

    #[test]
    fn test_counts() {
        let mut g = Graph::new(3);
        g.set_edges(0, vec![edge(1), edge(2)]);
        g.set_edges(2, vec![edge(0)]);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.max_degree(), 2);
        assert!(g.has_edge(0, 2));
        assert!(!g.has_edge(1, 0));
    }

    #[test]
    fn test_validate() {
        let mut g = Graph::new(2);
        g.set_edges(0, vec![edge(1)]);
        assert!(g.validate().is_ok());

        g.set_edges(1, vec![edge(1)]);
        assert!(g.validate().unwrap_err().contains("self-loop"));

        g.set_edges(1, vec![edge(0), edge(0)]);
        assert!(g.validate().unwrap_err().contains("twice"));

        g.set_edges(1, vec![edge(7)]);
        assert!(g.validate().unwrap_err().contains("targets 7"));

        let mut hollow = edge(0);
        hollow.alpha.clear();
        g.set_edges(1, vec![hollow]);
        assert!(g.validate().unwrap_err().contains("empty alpha"));
    }
}

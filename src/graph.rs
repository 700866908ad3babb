//! Dependency graph index.
//!
//! Indexes a flat edge list by origin and by dependent task so neighbor
//! lookups are O(1). Edge order and node order are the order of first
//! appearance in the input, which makes every traversal built on top of
//! the graph reproducible for the same input.

use std::collections::HashMap;

use crate::models::DependencyEdge;

/// Edge list with outgoing and incoming adjacency indices.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    nodes: Vec<String>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl DependencyGraph {
    /// Indexes `edges`. Self-dependencies and duplicates are kept; the
    /// cycle check reports the former.
    pub fn build(edges: &[DependencyEdge]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            graph.add(edge.clone());
        }
        graph
    }

    fn add(&mut self, edge: DependencyEdge) {
        let idx = self.edges.len();
        for id in [&edge.origin_id, &edge.dependent_id] {
            if !self.outgoing.contains_key(id.as_str()) {
                self.nodes.push(id.clone());
                self.outgoing.insert(id.clone(), Vec::new());
                self.incoming.insert(id.clone(), Vec::new());
            }
        }
        if let Some(out) = self.outgoing.get_mut(&edge.origin_id) {
            out.push(idx);
        }
        if let Some(inc) = self.incoming.get_mut(&edge.dependent_id) {
            inc.push(idx);
        }
        self.edges.push(edge);
    }

    /// All edges in input order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Edge at a position.
    #[inline]
    pub fn edge(&self, idx: usize) -> &DependencyEdge {
        &self.edges[idx]
    }

    /// Task ids in first-seen order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Edges leaving `task_id` (tasks that depend on it).
    pub fn outgoing(&self, task_id: &str) -> &[usize] {
        self.outgoing.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges entering `task_id` (tasks it depends on).
    pub fn incoming(&self, task_id: &str) -> &[usize] {
        self.incoming.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationKind;

    #[test]
    fn test_build_indices() {
        let edges = vec![
            DependencyEdge::finish_to_start("A", "B"),
            DependencyEdge::new("A", "C", RelationKind::StartToStart),
            DependencyEdge::finish_to_start("B", "C"),
        ];
        let graph = DependencyGraph::build(&edges);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.nodes(), &["A", "B", "C"]);
        assert_eq!(graph.outgoing("A"), &[0, 1]);
        assert_eq!(graph.incoming("C"), &[1, 2]);
        assert!(graph.incoming("A").is_empty());
        assert!(graph.outgoing("unknown").is_empty());
    }

    #[test]
    fn test_node_order_is_first_seen() {
        let edges = vec![
            DependencyEdge::finish_to_start("Z", "Y"),
            DependencyEdge::finish_to_start("X", "Z"),
        ];
        let graph = DependencyGraph::build(&edges);
        assert_eq!(graph.nodes(), &["Z", "Y", "X"]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}

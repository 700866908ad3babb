//! Plan arena.
//!
//! Holds the nodes of one snapshot in input order and indexes them by
//! id. Containment is navigated through a parent vector and a children
//! index built once at construction; nodes never point at each other.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::{NodeKind, PlanNode};
use crate::error::{PropagationError, Result};
use crate::validation::validate_plan;

/// Indexed working copy of a plan snapshot.
#[derive(Debug, Clone)]
pub struct Plan {
    nodes: Vec<PlanNode>,
    index: HashMap<String, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl Plan {
    /// Builds the arena from a snapshot.
    ///
    /// # Errors
    /// `InvalidPlan` if the snapshot fails structural validation.
    pub fn from_nodes(nodes: Vec<PlanNode>) -> Result<Self> {
        validate_plan(&nodes).map_err(PropagationError::InvalidPlan)?;

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let parents: Vec<Option<usize>> = nodes
            .iter()
            .map(|n| n.parent_id.as_ref().and_then(|p| index.get(p).copied()))
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(i);
            }
        }

        Ok(Self {
            nodes,
            index,
            parents,
            children,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the plan has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena position of a node id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Looks up a node by id.
    pub fn get(&self, id: &str) -> Option<&PlanNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Node at an arena position.
    #[inline]
    pub fn node(&self, idx: usize) -> &PlanNode {
        &self.nodes[idx]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut PlanNode {
        &mut self.nodes[idx]
    }

    /// All nodes in snapshot order.
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Consumes the arena, returning the nodes in snapshot order.
    pub fn into_nodes(self) -> Vec<PlanNode> {
        self.nodes
    }

    /// Parent position, if any.
    #[inline]
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Direct children positions, in snapshot order.
    #[inline]
    pub fn children_of(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Task positions in snapshot order.
    pub fn tasks(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(|&i| self.nodes[i].is_task())
    }

    /// Task children of `idx`'s parent, including `idx` itself.
    pub fn task_siblings(&self, idx: usize) -> Vec<usize> {
        match self.parent_of(idx) {
            Some(parent) => self.children[parent]
                .iter()
                .copied()
                .filter(|&c| self.nodes[c].kind == NodeKind::Task)
                .collect(),
            None => vec![idx],
        }
    }

    /// Nodes with children, deepest kinds first, so every container is
    /// listed after all of its descendant containers.
    pub fn containers_bottom_up(&self) -> Vec<usize> {
        let mut containers: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| !self.children[i].is_empty())
            .collect();
        containers.sort_by_key(|&i| (std::cmp::Reverse(self.nodes[i].kind.level()), i));
        containers
    }

    /// Span covering every date of a container's children.
    ///
    /// A child with only one date counts as an instant, so the result
    /// is either `None` on both sides or a span with `end >= start`.
    pub fn children_span(&self, idx: usize) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let dates = || {
            self.children[idx]
                .iter()
                .flat_map(|&c| [self.nodes[c].start, self.nodes[c].end])
                .flatten()
        };
        (dates().min(), dates().max())
    }
}

//! Input validation for propagation runs.
//!
//! Everything here runs before the engine touches its working copy, so
//! a rejected input never produces partial mutations. Detects:
//! - Duplicate node IDs
//! - Dangling or misplaced parent references
//! - Durations on non-task nodes; negative, non-finite, or oversized durations
//! - Circular dependencies (DAG validation)
//!
//! Edges that reference unknown ids are not rejected here; the
//! propagator skips them with a diagnostic.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (DFS)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PropagationError, Result};
use crate::graph::DependencyGraph;
use crate::models::{NodeKind, PlanNode, MAX_DURATION_HOURS};

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two nodes share the same ID.
    DuplicateId,
    /// A node references a parent that doesn't exist.
    UnknownParent,
    /// A non-phase node has no parent, or a phase has one.
    MisplacedRoot,
    /// A parent's kind is not above its child's kind.
    InvalidHierarchy,
    /// A container carries a duration estimate.
    DurationOnContainer,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the structure of a plan snapshot.
///
/// Checks:
/// 1. No duplicate node IDs
/// 2. Phases have no parent; every other node has one
/// 3. Every parent reference points to an existing node
/// 4. Every parent's kind is strictly above its child's kind
/// 5. Only tasks carry duration estimates
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_plan(nodes: &[PlanNode]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut kinds: HashMap<&str, NodeKind> = HashMap::new();
    for node in nodes {
        if kinds.insert(node.id.as_str(), node.kind).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate node ID: {}", node.id),
            ));
        }
    }

    for node in nodes {
        match (node.kind, node.parent_id.as_deref()) {
            (NodeKind::Phase, Some(parent)) => errors.push(ValidationError::new(
                ValidationErrorKind::MisplacedRoot,
                format!("Phase '{}' has parent '{}'", node.id, parent),
            )),
            (NodeKind::Phase, None) => {}
            (kind, None) => errors.push(ValidationError::new(
                ValidationErrorKind::MisplacedRoot,
                format!("{} '{}' has no parent", kind.as_str(), node.id),
            )),
            (kind, Some(parent)) => match kinds.get(parent) {
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownParent,
                    format!("Node '{}' references unknown parent '{}'", node.id, parent),
                )),
                Some(parent_kind) if parent_kind.level() >= kind.level() => {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidHierarchy,
                        format!(
                            "{} '{}' cannot be contained by {} '{}'",
                            kind.as_str(),
                            node.id,
                            parent_kind.as_str(),
                            parent
                        ),
                    ))
                }
                Some(_) => {}
            },
        }

        if !node.is_task() && node.estimated_hours.is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DurationOnContainer,
                format!("{} '{}' has a duration estimate", node.kind.as_str(), node.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Rejects negative, non-finite, or oversized task duration estimates.
///
/// # Errors
/// `InvalidDuration` naming the first offending task.
pub fn validate_durations(nodes: &[PlanNode]) -> Result<()> {
    for node in nodes {
        if let Some(hours) = node.estimated_hours {
            if !hours.is_finite() || !(0.0..=MAX_DURATION_HOURS).contains(&hours) {
                return Err(PropagationError::InvalidDuration {
                    subject: format!("task '{}'", node.id),
                    hours,
                });
            }
        }
    }
    Ok(())
}

/// Finds a cycle in the dependency graph.
///
/// # Algorithm
/// Iterative DFS from every node in first-seen order, tracking the
/// current path; reaching a node that is still on the path closes a
/// cycle. Fully explored nodes cannot reach a cycle and are skipped by
/// later traversals, so the whole search is O(V + E).
///
/// # Returns
/// The cycle as task ids, closed on its first node (`[A, B, C, A]`),
/// or `None` if the graph is acyclic.
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
    let mut finished: HashSet<&str> = HashSet::new();
    for root in graph.nodes() {
        let root = root.as_str();
        if finished.contains(root) {
            continue;
        }
        let mut on_path: Vec<&str> = vec![root];
        let mut in_stack: HashSet<&str> = HashSet::from([root]);
        // (node, next outgoing edge to try)
        let mut frames: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;
            match graph.outgoing(node).get(cursor) {
                Some(&edge_idx) => {
                    frame.1 += 1;
                    let next = graph.edge(edge_idx).dependent_id.as_str();
                    if in_stack.contains(next) {
                        let pos = on_path.iter().position(|&n| n == next).unwrap_or(0);
                        let mut path: Vec<String> =
                            on_path[pos..].iter().map(|n| n.to_string()).collect();
                        path.push(next.to_string());
                        return Some(path);
                    }
                    if !finished.contains(next) {
                        in_stack.insert(next);
                        on_path.push(next);
                        frames.push((next, 0));
                    }
                }
                None => {
                    frames.pop();
                    in_stack.remove(node);
                    finished.insert(node);
                    on_path.pop();
                }
            }
        }
    }
    None
}

/// Fails with `CyclicDependency` if the graph has a cycle.
pub fn ensure_acyclic(graph: &DependencyGraph) -> Result<()> {
    match find_cycle(graph) {
        Some(path) => Err(PropagationError::CyclicDependency { path }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DependencyEdge;

    fn sample_nodes() -> Vec<PlanNode> {
        vec![
            PlanNode::phase("P1"),
            PlanNode::element("E1", "P1"),
            PlanNode::activity("A1", "E1"),
            PlanNode::task("T1", "A1").with_estimated_hours(8.0),
            PlanNode::task("T2", "A1"),
        ]
    }

    fn graph(pairs: &[(&str, &str)]) -> DependencyGraph {
        let edges: Vec<DependencyEdge> = pairs
            .iter()
            .map(|(a, b)| DependencyEdge::finish_to_start(*a, *b))
            .collect();
        DependencyGraph::build(&edges)
    }

    #[test]
    fn test_valid_plan() {
        assert!(validate_plan(&sample_nodes()).is_ok());
        assert!(validate_durations(&sample_nodes()).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let mut nodes = sample_nodes();
        nodes.push(PlanNode::task("T1", "A1"));
        let errors = validate_plan(&nodes).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("T1")));
    }

    #[test]
    fn test_unknown_parent() {
        let mut nodes = sample_nodes();
        nodes.push(PlanNode::task("T3", "NOPE"));
        let errors = validate_plan(&nodes).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownParent));
    }

    #[test]
    fn test_misplaced_roots() {
        let mut orphan = PlanNode::task("T3", "A1");
        orphan.parent_id = None;
        let mut child_phase = PlanNode::phase("P2");
        child_phase.parent_id = Some("P1".into());

        let mut nodes = sample_nodes();
        nodes.push(orphan);
        nodes.push(child_phase);
        let errors = validate_plan(&nodes).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::MisplacedRoot)
                .count(),
            2
        );
    }

    #[test]
    fn test_invalid_hierarchy() {
        let mut nodes = sample_nodes();
        // Activity under a task
        nodes.push(PlanNode::activity("A2", "T1"));
        let errors = validate_plan(&nodes).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidHierarchy));
    }

    #[test]
    fn test_task_directly_under_element_allowed() {
        let mut nodes = sample_nodes();
        nodes.push(PlanNode::task("T9", "E1"));
        assert!(validate_plan(&nodes).is_ok());
    }

    #[test]
    fn test_duration_on_container() {
        let mut nodes = sample_nodes();
        nodes[2].estimated_hours = Some(4.0);
        let errors = validate_plan(&nodes).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DurationOnContainer));
    }

    #[test]
    fn test_negative_duration() {
        let mut nodes = sample_nodes();
        nodes[4].estimated_hours = Some(-2.0);
        let err = validate_durations(&nodes).unwrap_err();
        assert!(matches!(err, PropagationError::InvalidDuration { hours, .. } if hours == -2.0));
    }

    #[test]
    fn test_oversized_duration() {
        let mut nodes = sample_nodes();
        nodes[4].estimated_hours = Some(1e300);
        assert!(matches!(
            validate_durations(&nodes),
            Err(PropagationError::InvalidDuration { .. })
        ));

        nodes[4].estimated_hours = Some(MAX_DURATION_HOURS);
        assert!(validate_durations(&nodes).is_ok());
    }

    #[test]
    fn test_cycle_path() {
        // A → B → C → A
        let g = graph(&[("A", "B"), ("B", "C"), ("C", "A")]);
        assert_eq!(
            find_cycle(&g),
            Some(vec!["A".into(), "B".into(), "C".into(), "A".into()])
        );
        assert!(matches!(
            ensure_acyclic(&g),
            Err(PropagationError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_cycle_not_through_root() {
        // X → A → B → A: path starts at the re-entered node
        let g = graph(&[("X", "A"), ("A", "B"), ("B", "A")]);
        assert_eq!(
            find_cycle(&g),
            Some(vec!["A".into(), "B".into(), "A".into()])
        );
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let g = graph(&[("A", "A")]);
        assert_eq!(find_cycle(&g), Some(vec!["A".into(), "A".into()]));
    }

    #[test]
    fn test_diamond_is_not_cycle() {
        // A → B → D, A → C → D
        let g = graph(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        assert_eq!(find_cycle(&g), None);
        assert!(ensure_acyclic(&g).is_ok());
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let g = graph(&[("A", "B"), ("B", "C")]);
        assert_eq!(find_cycle(&g), None);
    }
}

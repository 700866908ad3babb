//! Plan node model.
//!
//! A plan is a containment tree of four node kinds:
//!
//! | Kind | Contains | Typical meaning |
//! |------|----------|-----------------|
//! | Phase | Elements | Project stage |
//! | Element | Activities | Work-breakdown element (EDT) |
//! | Activity | Tasks | Group of related work |
//! | Task | - | Schedulable unit with a duration |
//!
//! All kinds share one shape. Only tasks carry a duration estimate and
//! a milestone flag; container dates are derived from their children.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of a plan node, ordered from root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Phase,
    Element,
    Activity,
    Task,
}

impl NodeKind {
    /// Depth of this kind in the hierarchy (phase = 0).
    pub fn level(self) -> u8 {
        match self {
            Self::Phase => 0,
            Self::Element => 1,
            Self::Activity => 2,
            Self::Task => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::Element => "element",
            Self::Activity => "activity",
            Self::Task => "task",
        }
    }
}

/// A node in the planning tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNode {
    /// Unique node identifier.
    pub id: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Planned start.
    pub start: Option<NaiveDateTime>,
    /// Planned end.
    pub end: Option<NaiveDateTime>,
    /// Estimated working hours (tasks only). `None` = derive from the
    /// current span.
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Milestone flag (tasks only).
    #[serde(default)]
    pub is_milestone: bool,
    /// Containing node. `None` only for phases.
    pub parent_id: Option<String>,
}

impl PlanNode {
    fn new(id: impl Into<String>, kind: NodeKind, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: String::new(),
            start: None,
            end: None,
            estimated_hours: None,
            is_milestone: false,
            parent_id,
        }
    }

    /// Creates a root phase.
    pub fn phase(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Phase, None)
    }

    /// Creates an element under a phase.
    pub fn element(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Element, Some(parent_id.into()))
    }

    /// Creates an activity under an element.
    pub fn activity(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Activity, Some(parent_id.into()))
    }

    /// Creates a task under an activity.
    pub fn task(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Task, Some(parent_id.into()))
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets start and end.
    pub fn with_span(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Sets the start only.
    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the estimated working hours.
    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Marks the node as a milestone.
    pub fn as_milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    /// Whether this node is a task.
    #[inline]
    pub fn is_task(&self) -> bool {
        self.kind == NodeKind::Task
    }

    /// Start and end, if both are set.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start?, self.end?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_node_builder() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();

        let node = PlanNode::task("T1", "A1")
            .with_name("Pour slab")
            .with_span(start, end)
            .with_estimated_hours(16.0);

        assert_eq!(node.kind, NodeKind::Task);
        assert_eq!(node.parent_id.as_deref(), Some("A1"));
        assert_eq!(node.span(), Some((start, end)));
        assert_eq!(node.name, "Pour slab");
        assert!(node.is_task());
        assert!(!node.is_milestone);
    }

    #[test]
    fn test_kind_levels() {
        assert!(NodeKind::Phase.level() < NodeKind::Element.level());
        assert!(NodeKind::Element.level() < NodeKind::Activity.level());
        assert!(NodeKind::Activity.level() < NodeKind::Task.level());
        assert_eq!(NodeKind::Element.as_str(), "element");
    }

    #[test]
    fn test_phase_defaults() {
        let node = PlanNode::phase("P1");
        assert!(node.name.is_empty());
        assert!(node.parent_id.is_none());
        assert!(node.span().is_none());
    }

    #[test]
    fn test_node_serde() {
        let json = r#"{"id":"T1","kind":"task","start":null,"end":null,"parent_id":"A1"}"#;
        let node: PlanNode = serde_json::from_str(json).unwrap();
        assert_eq!(node, PlanNode::task("T1", "A1"));
    }
}

//! Propagation run metrics.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Tasks moved | Distinct tasks pushed by a dependency |
//! | Tasks re-sequenced | Distinct tasks pushed by a sibling |
//! | Containers adjusted | Distinct containers whose span changed |
//! | Milestones flagged | Tasks newly marked as milestones |
//! | Plan span | Earliest phase start, latest phase end |

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::PropagationOutcome;
use crate::models::{ChangeReason, NodeKind};

/// Counts describing what one run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationSummary {
    /// Tasks moved by at least one dependency edge.
    pub tasks_moved: usize,
    /// Tasks moved by sibling re-sequencing.
    pub tasks_resequenced: usize,
    /// Containers whose start or end changed.
    pub containers_adjusted: usize,
    /// Tasks newly flagged as milestones.
    pub milestones_flagged: usize,
    /// Number of diagnostics.
    pub diagnostics: usize,
    /// Earliest start across root nodes after the run.
    pub plan_start: Option<NaiveDateTime>,
    /// Latest end across root nodes after the run.
    pub plan_end: Option<NaiveDateTime>,
}

impl PropagationSummary {
    /// Computes metrics from a run's outcome.
    pub fn calculate(outcome: &PropagationOutcome) -> Self {
        let mut moved = HashSet::new();
        let mut resequenced = HashSet::new();
        let mut containers = HashSet::new();
        let mut milestones = 0;

        for change in &outcome.changes {
            let id = change.node_id.as_str();
            match change.reason {
                ChangeReason::DependencyApplied { .. } => {
                    moved.insert(id);
                }
                ChangeReason::ResequencedBySibling { .. } => {
                    resequenced.insert(id);
                }
                ChangeReason::ParentSpanAdjusted => {
                    containers.insert(id);
                }
                ChangeReason::MilestoneFlagged => milestones += 1,
                ChangeReason::MilestoneNormalized | ChangeReason::SpanRepaired => {}
            }
        }

        let roots = outcome.nodes.iter().filter(|n| n.kind == NodeKind::Phase);
        let plan_start = roots.clone().filter_map(|n| n.start).min();
        let plan_end = roots.filter_map(|n| n.end).max();

        Self {
            tasks_moved: moved.len(),
            tasks_resequenced: resequenced.len(),
            containers_adjusted: containers.len(),
            milestones_flagged: milestones,
            diagnostics: outcome.diagnostics.len(),
            plan_start,
            plan_end,
        }
    }

    /// Whether the run changed nothing and reported nothing.
    pub fn is_quiet(&self) -> bool {
        self.tasks_moved == 0
            && self.tasks_resequenced == 0
            && self.containers_adjusted == 0
            && self.milestones_flagged == 0
            && self.diagnostics == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeRecord, Diagnostic, DiagnosticKind, PlanNode, RelationKind};
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_counts() {
        let dep = ChangeReason::DependencyApplied {
            relation: RelationKind::FinishToStart,
            origin_id: "A".into(),
        };
        let outcome = PropagationOutcome {
            nodes: vec![
                PlanNode::phase("P1").with_span(ts(1, 8), ts(5, 17)),
                PlanNode::phase("P2").with_span(ts(2, 8), ts(9, 17)),
            ],
            changes: vec![
                ChangeRecord::start("B", None, Some(ts(4, 8)), dep.clone()),
                ChangeRecord::end("B", None, Some(ts(5, 17)), dep),
                ChangeRecord::start(
                    "C",
                    None,
                    Some(ts(8, 8)),
                    ChangeReason::ResequencedBySibling {
                        predecessor_id: "B".into(),
                    },
                ),
                ChangeRecord::end("A1", None, Some(ts(9, 17)), ChangeReason::ParentSpanAdjusted),
                ChangeRecord::milestone_flagged("M"),
            ],
            diagnostics: vec![Diagnostic::new(DiagnosticKind::SkippedEdge, "X -> Y", "missing")],
        };

        let summary = outcome.summary();
        assert_eq!(summary.tasks_moved, 1);
        assert_eq!(summary.tasks_resequenced, 1);
        assert_eq!(summary.containers_adjusted, 1);
        assert_eq!(summary.milestones_flagged, 1);
        assert_eq!(summary.diagnostics, 1);
        assert_eq!(summary.plan_start, Some(ts(1, 8)));
        assert_eq!(summary.plan_end, Some(ts(9, 17)));
        assert!(!summary.is_quiet());
    }

    #[test]
    fn test_quiet_run() {
        let outcome = PropagationOutcome {
            nodes: vec![PlanNode::phase("P1")],
            changes: vec![],
            diagnostics: vec![],
        };
        let summary = PropagationSummary::calculate(&outcome);
        assert!(summary.is_quiet());
        assert_eq!(summary.plan_start, None);
    }
}

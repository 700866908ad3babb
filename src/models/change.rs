//! Change records and diagnostics.
//!
//! Every mutation the engine makes to its working copy is recorded as a
//! [`ChangeRecord`], in the order it happened. Conditions the engine
//! recovered from (a missing date, an edge to an unknown task) become
//! [`Diagnostic`]s; they never abort a run.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::RelationKind;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Field of a plan node that a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    Start,
    End,
    IsMilestone,
}

impl fmt::Display for ChangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::End => "end",
            Self::IsMilestone => "is_milestone",
        })
    }
}

/// Old or new value of a changed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeValue {
    Timestamp(Option<NaiveDateTime>),
    Flag(bool),
}

impl fmt::Display for ChangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(Some(ts)) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Self::Timestamp(None) => f.write_str("(none)"),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Why the engine changed a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ChangeReason {
    /// A dependency edge pushed the task later.
    DependencyApplied {
        relation: RelationKind,
        origin_id: String,
    },
    /// A sibling earlier in the activity moved and this task followed.
    ResequencedBySibling { predecessor_id: String },
    /// A container's span was recomputed from its children.
    ParentSpanAdjusted,
    /// A zero-duration task had its end pulled back to its start.
    MilestoneNormalized,
    /// A task whose end preceded its start had its end recomputed.
    SpanRepaired,
    /// The milestone flag was set.
    MilestoneFlagged,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyApplied {
                relation,
                origin_id,
            } => write!(f, "dependency {} applied from {origin_id}", relation.code()),
            Self::ResequencedBySibling { predecessor_id } => {
                write!(f, "re-sequenced by sibling {predecessor_id}")
            }
            Self::ParentSpanAdjusted => f.write_str("parent span adjusted"),
            Self::MilestoneNormalized => f.write_str("milestone normalized"),
            Self::SpanRepaired => f.write_str("span repaired"),
            Self::MilestoneFlagged => f.write_str("milestone flagged"),
        }
    }
}

/// One field mutation made during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Node that changed.
    pub node_id: String,
    /// Field that changed.
    pub field: ChangeField,
    /// Value before the change.
    pub old_value: ChangeValue,
    /// Value after the change.
    pub new_value: ChangeValue,
    /// Cause of the change.
    pub reason: ChangeReason,
}

impl ChangeRecord {
    /// Records a start change.
    pub fn start(
        node_id: impl Into<String>,
        old: Option<NaiveDateTime>,
        new: Option<NaiveDateTime>,
        reason: ChangeReason,
    ) -> Self {
        Self::timestamp(node_id, ChangeField::Start, old, new, reason)
    }

    /// Records an end change.
    pub fn end(
        node_id: impl Into<String>,
        old: Option<NaiveDateTime>,
        new: Option<NaiveDateTime>,
        reason: ChangeReason,
    ) -> Self {
        Self::timestamp(node_id, ChangeField::End, old, new, reason)
    }

    fn timestamp(
        node_id: impl Into<String>,
        field: ChangeField,
        old: Option<NaiveDateTime>,
        new: Option<NaiveDateTime>,
        reason: ChangeReason,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            field,
            old_value: ChangeValue::Timestamp(old),
            new_value: ChangeValue::Timestamp(new),
            reason,
        }
    }

    /// Records the milestone flag being set.
    pub fn milestone_flagged(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            field: ChangeField::IsMilestone,
            old_value: ChangeValue::Flag(false),
            new_value: ChangeValue::Flag(true),
            reason: ChangeReason::MilestoneFlagged,
        }
    }
}

/// Category of a recovered condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A dependency edge was not enforced this run.
    SkippedEdge,
    /// A task could not be moved or re-sequenced.
    SkippedTask,
    /// The cascade stopped at its step budget.
    CascadeLimit,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SkippedEdge => "skipped edge",
            Self::SkippedTask => "skipped task",
            Self::CascadeLimit => "cascade limit",
        })
    }
}

/// Warning-level note about something the run could not do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Edge (`origin -> dependent`) or node id the note is about.
    pub subject: String,
    pub kind: DiagnosticKind,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {} {}: {}", self.kind, self.subject, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reason_tags() {
        let reason = ChangeReason::DependencyApplied {
            relation: RelationKind::FinishToStart,
            origin_id: "A".into(),
        };
        assert_eq!(reason.to_string(), "dependency FS applied from A");
        assert_eq!(ChangeReason::ParentSpanAdjusted.to_string(), "parent span adjusted");
        assert_eq!(
            ChangeReason::ResequencedBySibling {
                predecessor_id: "C".into()
            }
            .to_string(),
            "re-sequenced by sibling C"
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ChangeValue::Timestamp(Some(ts(4, 8))).to_string(), "2024-01-04 08:00");
        assert_eq!(ChangeValue::Timestamp(None).to_string(), "(none)");
        assert_eq!(ChangeValue::Flag(true).to_string(), "true");
    }

    #[test]
    fn test_record_constructors() {
        let rec = ChangeRecord::start("B", Some(ts(1, 8)), Some(ts(4, 8)), ChangeReason::ParentSpanAdjusted);
        assert_eq!(rec.field, ChangeField::Start);
        assert_eq!(rec.old_value, ChangeValue::Timestamp(Some(ts(1, 8))));

        let flag = ChangeRecord::milestone_flagged("M");
        assert_eq!(flag.field, ChangeField::IsMilestone);
        assert_eq!(flag.new_value, ChangeValue::Flag(true));
        assert_eq!(flag.reason, ChangeReason::MilestoneFlagged);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(DiagnosticKind::SkippedEdge, "A -> B", "origin 'A' has no end date");
        assert_eq!(
            diag.to_string(),
            "warning: skipped edge A -> B: origin 'A' has no end date"
        );
    }

    #[test]
    fn test_record_serde() {
        let rec = ChangeRecord::end(
            "B",
            None,
            Some(ts(5, 17)),
            ChangeReason::DependencyApplied {
                relation: RelationKind::StartToStart,
                origin_id: "A".into(),
            },
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["reason"]["reason"], "dependency_applied");
        assert_eq!(json["reason"]["relation"], "SS");
        let back: ChangeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}

//! Milestone classification.
//!
//! A task is a milestone when its duration estimate is zero or its span
//! has collapsed to a single instant. The pass only ever sets the flag;
//! an existing milestone is never demoted.

use crate::models::{ChangeRecord, Plan, PlanNode};

/// Whether a task qualifies as a milestone on its current dates.
pub fn is_milestone_candidate(node: &PlanNode) -> bool {
    node.is_task()
        && (node.estimated_hours == Some(0.0)
            || matches!(node.span(), Some((start, end)) if start == end))
}

/// Flags every qualifying task that is not yet a milestone.
///
/// Returns one record per flag set, in snapshot order.
pub fn classify_milestones(plan: &mut Plan) -> Vec<ChangeRecord> {
    let candidates: Vec<usize> = plan
        .tasks()
        .filter(|&i| {
            let node = plan.node(i);
            !node.is_milestone && is_milestone_candidate(node)
        })
        .collect();

    candidates
        .into_iter()
        .map(|i| {
            let node = plan.node_mut(i);
            node.is_milestone = true;
            ChangeRecord::milestone_flagged(node.id.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn plan() -> Plan {
        Plan::from_nodes(vec![
            PlanNode::phase("P"),
            PlanNode::element("E", "P"),
            PlanNode::activity("A", "E"),
            PlanNode::task("work", "A")
                .with_span(ts(1, 8), ts(2, 17))
                .with_estimated_hours(16.0),
            PlanNode::task("zero", "A")
                .with_span(ts(3, 8), ts(3, 8))
                .with_estimated_hours(0.0),
            PlanNode::task("instant", "A").with_span(ts(4, 8), ts(4, 8)),
            PlanNode::task("flagged", "A")
                .with_span(ts(4, 8), ts(4, 17))
                .as_milestone(),
        ])
        .unwrap()
    }

    #[test]
    fn test_classify() {
        let mut plan = plan();
        let records = classify_milestones(&mut plan);

        let ids: Vec<&str> = records.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(ids, vec!["zero", "instant"]);
        assert!(plan.get("zero").unwrap().is_milestone);
        assert!(plan.get("instant").unwrap().is_milestone);
        assert!(!plan.get("work").unwrap().is_milestone);
    }

    #[test]
    fn test_never_unmarks() {
        let mut plan = plan();
        classify_milestones(&mut plan);
        // Flagged task has a real span but keeps its flag
        assert!(plan.get("flagged").unwrap().is_milestone);
    }

    #[test]
    fn test_second_pass_is_silent() {
        let mut plan = plan();
        classify_milestones(&mut plan);
        assert!(classify_milestones(&mut plan).is_empty());
    }

    #[test]
    fn test_containers_ignored() {
        let node = PlanNode::activity("A", "E").with_span(ts(1, 8), ts(1, 8));
        assert!(!is_milestone_candidate(&node));
    }
}

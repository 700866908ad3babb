//! Hierarchical date propagator.
//!
//! # Algorithm
//!
//! 1. **Validating**: calendar, durations, plan structure, and the
//!    dependency cycle check. Any failure aborts before mutation.
//! 2. **Resolving**: zero-duration and inverted task spans are
//!    normalized, then every edge is resolved in input order against the
//!    current dates. A dependent is only ever pushed later; moved tasks
//!    join a FIFO worklist.
//! 3. For each worklist task:
//!    - **PropagatingUp**: parent spans are recomputed from their direct
//!      children while anything changes.
//!    - **PropagatingDown**: later siblings (ordered by their start at
//!      the beginning of the run) start no earlier than the working day
//!      after their predecessor ends.
//!    - **PropagatingAcross**: the task's outgoing edges are re-resolved.
//! 4. **PropagatingUp** once more over every container, bottom-up, so
//!    untouched branches also satisfy the containment invariant.
//! 5. **Classifying**: milestone flags.
//!
//! # Complexity
//! Each worklist visit costs O(depth + siblings + out-degree). A task is
//! revisited only when its dates changed since its last visit.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! (forward pass over a precedence network)

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::changelog::ChangeLog;
use super::milestone::classify_milestones;
use super::resolver::resolve;
use super::state::{PropagationState, StateTracker};
use super::summary::PropagationSummary;
use super::PropagationConfig;
use crate::error::{PropagationError, Result};
use crate::graph::DependencyGraph;
use crate::models::{
    ChangeReason, ChangeRecord, DependencyEdge, Diagnostic, DiagnosticKind, NodeKind, Plan,
    PlanNode, WorkingCalendar,
};
use crate::validation::{ensure_acyclic, validate_durations};

type Span = (Option<NaiveDateTime>, Option<NaiveDateTime>);

/// Result of a successful propagation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationOutcome {
    /// Mutated snapshot, in input order.
    pub nodes: Vec<PlanNode>,
    /// Every field change, in the order it was made.
    pub changes: Vec<ChangeRecord>,
    /// Recovered conditions, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl PropagationOutcome {
    /// Whether the run changed nothing.
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    /// Looks up a node of the mutated snapshot.
    pub fn node(&self, id: &str) -> Option<&PlanNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Changes made to one node.
    pub fn changes_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ChangeRecord> + 'a {
        self.changes.iter().filter(move |c| c.node_id == id)
    }

    /// Audit lines: changes in causal order, then diagnostics.
    pub fn change_log(&self) -> Vec<String> {
        let mut lines = ChangeLog::new().with_nodes(&self.nodes).build(&self.changes);
        lines.extend(self.diagnostics.iter().map(ToString::to_string));
        lines
    }

    /// Run metrics.
    pub fn summary(&self) -> PropagationSummary {
        PropagationSummary::calculate(self)
    }
}

/// Propagates dependency, sibling, and containment constraints through
/// a plan snapshot.
///
/// Holds configuration only; each call works on its own copy of the
/// snapshot, so one propagator can serve many plans and threads.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_plan::models::{DependencyEdge, PlanNode, WorkingCalendar};
/// use u_plan::propagation::Propagator;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let nodes = vec![
///     PlanNode::phase("P"),
///     PlanNode::element("E", "P"),
///     PlanNode::activity("A1", "E"),
///     PlanNode::task("A", "A1")
///         .with_span(day(1).and_hms_opt(8, 0, 0).unwrap(), day(3).and_hms_opt(17, 0, 0).unwrap())
///         .with_estimated_hours(24.0),
///     PlanNode::activity("A2", "E"),
///     PlanNode::task("B", "A2")
///         .with_span(day(1).and_hms_opt(8, 0, 0).unwrap(), day(2).and_hms_opt(17, 0, 0).unwrap())
///         .with_estimated_hours(16.0),
/// ];
/// let edges = vec![DependencyEdge::finish_to_start("A", "B")];
/// let calendar = WorkingCalendar::standard("std");
///
/// let outcome = Propagator::new().propagate(&nodes, &edges, &calendar).unwrap();
/// let b = outcome.node("B").unwrap();
/// assert_eq!(b.start, Some(day(4).and_hms_opt(8, 0, 0).unwrap()));
/// assert_eq!(b.end, Some(day(5).and_hms_opt(17, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    config: PropagationConfig,
}

impl Propagator {
    /// Creates a propagator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: PropagationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// Runs one propagation over a snapshot.
    ///
    /// Dependencies only ever push a dependent later: a task that already
    /// starts after its required start keeps its dates and is never pulled
    /// earlier. Edges, siblings, and tasks whose dates are missing or
    /// would leave the representable range are skipped with a
    /// [`Diagnostic`] instead of failing the run.
    ///
    /// # Errors
    /// `CyclicDependency`, `InvalidCalendar`, `InvalidDuration`, or
    /// `InvalidPlan`, all detected before any date is changed. The input
    /// is never modified.
    pub fn propagate(
        &self,
        nodes: &[PlanNode],
        edges: &[DependencyEdge],
        calendar: &WorkingCalendar,
    ) -> Result<PropagationOutcome> {
        let mut state = StateTracker::new();
        state.enter(PropagationState::Validating);
        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            calendar = %calendar.id,
            "propagation started"
        );

        let (plan, graph) = match Self::validate(nodes, edges, calendar) {
            Ok(validated) => validated,
            Err(err) => {
                state.enter(PropagationState::Aborted);
                warn!(error = %err, state = %state.current(), "propagation aborted");
                return Err(err);
            }
        };

        let outcome = Run::new(&self.config, calendar, plan, graph, state).execute()?;
        info!(
            changes = outcome.changes.len(),
            diagnostics = outcome.diagnostics.len(),
            "propagation finished"
        );
        Ok(outcome)
    }

    fn validate(
        nodes: &[PlanNode],
        edges: &[DependencyEdge],
        calendar: &WorkingCalendar,
    ) -> Result<(Plan, DependencyGraph)> {
        calendar.validate()?;
        validate_durations(nodes)?;
        let plan = Plan::from_nodes(nodes.to_vec())?;
        let graph = DependencyGraph::build(edges);
        ensure_acyclic(&graph)?;
        Ok((plan, graph))
    }
}

/// Runs [`Propagator::propagate`] with the default configuration.
pub fn propagate(
    nodes: &[PlanNode],
    edges: &[DependencyEdge],
    calendar: &WorkingCalendar,
) -> Result<PropagationOutcome> {
    Propagator::new().propagate(nodes, edges, calendar)
}

/// Mutable state of one run.
struct Run<'a> {
    config: &'a PropagationConfig,
    calendar: &'a WorkingCalendar,
    plan: Plan,
    graph: DependencyGraph,
    state: StateTracker,
    /// Task starts as received; fixes sibling order for the whole run.
    initial_starts: Vec<Option<NaiveDateTime>>,
    changes: Vec<ChangeRecord>,
    diagnostics: Vec<Diagnostic>,
    worklist: VecDeque<usize>,
    queued: HashSet<usize>,
    /// Dates of each task when it was last taken off the worklist.
    visited: HashMap<usize, Span>,
    reported_edges: HashSet<usize>,
    reported_tasks: HashSet<usize>,
    steps: usize,
}

impl<'a> Run<'a> {
    fn new(
        config: &'a PropagationConfig,
        calendar: &'a WorkingCalendar,
        plan: Plan,
        graph: DependencyGraph,
        state: StateTracker,
    ) -> Self {
        let initial_starts = plan.nodes().iter().map(|n| n.start).collect();
        Self {
            config,
            calendar,
            plan,
            graph,
            state,
            initial_starts,
            changes: Vec::new(),
            diagnostics: Vec::new(),
            worklist: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashMap::new(),
            reported_edges: HashSet::new(),
            reported_tasks: HashSet::new(),
            steps: 0,
        }
    }

    fn execute(mut self) -> Result<PropagationOutcome> {
        self.state.enter(PropagationState::Resolving);
        self.normalize_tasks()?;
        for edge_idx in 0..self.graph.edge_count() {
            self.apply_edge(edge_idx)?;
        }

        self.cascade()?;

        self.state.enter(PropagationState::PropagatingUp);
        for container in self.plan.containers_bottom_up() {
            self.refresh_container(container);
        }

        self.state.enter(PropagationState::Classifying);
        let flagged = classify_milestones(&mut self.plan);
        self.changes.extend(flagged);

        self.state.enter(PropagationState::Done);
        Ok(PropagationOutcome {
            nodes: self.plan.into_nodes(),
            changes: self.changes,
            diagnostics: self.diagnostics,
        })
    }

    /// Collapses zero-duration spans onto whichever date they have and
    /// repairs spans that end before they start.
    fn normalize_tasks(&mut self) -> Result<()> {
        let tasks: Vec<usize> = self.plan.tasks().collect();
        for idx in tasks {
            let node = self.plan.node(idx);
            let (start, end) = (node.start, node.end);

            if node.estimated_hours == Some(0.0) {
                let Some(instant) = start.or(end) else { continue };
                if (start, end) != (Some(instant), Some(instant)) {
                    debug!(task = %node.id, %instant, "zero-duration span collapsed");
                    self.set_span(idx, instant, instant, ChangeReason::MilestoneNormalized);
                }
                continue;
            }

            let Some((start, end)) = node.span() else { continue };
            if end >= start {
                continue;
            }
            let hours = node.estimated_hours.unwrap_or(0.0);
            match recoverable(self.calendar.add_working_hours(start, hours))? {
                Ok(repaired) => {
                    debug!(task = %self.plan.node(idx).id, %repaired, "inverted span repaired");
                    self.set_span(idx, start, repaired, ChangeReason::SpanRepaired);
                }
                Err(reason) => {
                    let message = format!("ends before it starts and was not repaired: {reason}");
                    self.skip_task(idx, &message);
                }
            }
        }
        Ok(())
    }

    /// Processes the worklist until it drains or the step budget runs out.
    fn cascade(&mut self) -> Result<()> {
        while let Some(task) = self.worklist.pop_front() {
            self.queued.remove(&task);

            let node = self.plan.node(task);
            let span = (node.start, node.end);
            if self.visited.get(&task) == Some(&span) {
                continue;
            }

            if self.steps >= self.config.max_cascade_steps {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::CascadeLimit,
                    node.id.clone(),
                    format!(
                        "stopped after {} steps; {} task(s) left unprocessed",
                        self.steps,
                        self.worklist.len() + 1
                    ),
                );
                self.report(diagnostic);
                self.worklist.clear();
                self.queued.clear();
                break;
            }
            self.steps += 1;
            self.visited.insert(task, span);

            self.state.enter(PropagationState::PropagatingUp);
            self.propagate_up(task);

            self.state.enter(PropagationState::PropagatingDown);
            self.resequence_siblings(task)?;

            self.state.enter(PropagationState::PropagatingAcross);
            self.propagate_across(task)?;
        }
        Ok(())
    }

    /// Resolves one edge and pushes its dependent later if required.
    fn apply_edge(&mut self, edge_idx: usize) -> Result<()> {
        let edge = self.graph.edge(edge_idx).clone();
        let (origin, dependent) = match (
            self.plan.index_of(&edge.origin_id),
            self.plan.index_of(&edge.dependent_id),
        ) {
            (Some(o), Some(d)) => (o, d),
            (None, _) => {
                self.skip_edge(edge_idx, format!("origin '{}' is not in the plan", edge.origin_id));
                return Ok(());
            }
            (_, None) => {
                self.skip_edge(
                    edge_idx,
                    format!("dependent '{}' is not in the plan", edge.dependent_id),
                );
                return Ok(());
            }
        };

        for idx in [origin, dependent] {
            let node = self.plan.node(idx);
            if node.kind != NodeKind::Task {
                let message = format!("'{}' is a {}, not a task", node.id, node.kind.as_str());
                self.skip_edge(edge_idx, message);
                return Ok(());
            }
        }

        let Some(current_start) = self.plan.node(dependent).start else {
            self.skip_edge(
                edge_idx,
                format!("dependent '{}' has no start date", edge.dependent_id),
            );
            return Ok(());
        };
        let Some(hours) = self.task_hours(dependent) else {
            self.skip_edge(
                edge_idx,
                format!("dependent '{}' has no duration or end date", edge.dependent_id),
            );
            return Ok(());
        };

        let origin_node = self.plan.node(origin);
        let resolved = recoverable(resolve(
            edge.relation,
            origin_node.start,
            origin_node.end,
            hours,
            edge.lag,
            self.calendar,
        ))?;
        let required = match resolved {
            Ok(required) => required,
            Err(reason) => {
                self.skip_edge(edge_idx, format!("date out of range: {reason}"));
                return Ok(());
            }
        };
        let Some(required) = required else {
            self.skip_edge(
                edge_idx,
                format!(
                    "origin '{}' has no {} date",
                    edge.origin_id,
                    edge.relation.origin_anchor().as_str()
                ),
            );
            return Ok(());
        };

        if required > current_start {
            let reason = ChangeReason::DependencyApplied {
                relation: edge.relation,
                origin_id: edge.origin_id.clone(),
            };
            if let Err(reason) = recoverable(self.move_task(dependent, required, hours, reason))? {
                self.skip_edge(edge_idx, format!("date out of range: {reason}"));
            }
        }
        Ok(())
    }

    /// Working hours of a task: its estimate, else its current span.
    fn task_hours(&self, idx: usize) -> Option<f64> {
        let node = self.plan.node(idx);
        node.estimated_hours.or_else(|| {
            node.span()
                .map(|(start, end)| self.calendar.working_hours_between(start, end))
        })
    }

    /// Moves a task to `start` and recomputes its end. Nothing changes
    /// if the end cannot be computed.
    fn move_task(
        &mut self,
        idx: usize,
        start: NaiveDateTime,
        hours: f64,
        reason: ChangeReason,
    ) -> Result<()> {
        let end = self.calendar.add_working_hours(start, hours)?;
        debug!(task = %self.plan.node(idx).id, %start, %end, reason = %reason, "task moved");
        self.set_span(idx, start, end, reason);
        Ok(())
    }

    /// Writes a task span, records each field that changed, and queues
    /// the task.
    fn set_span(
        &mut self,
        idx: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
        reason: ChangeReason,
    ) {
        let node = self.plan.node_mut(idx);
        let (old_start, old_end) = (node.start, node.end);
        node.start = Some(start);
        node.end = Some(end);

        let id = node.id.clone();
        if old_start != Some(start) {
            self.changes
                .push(ChangeRecord::start(id.clone(), old_start, Some(start), reason.clone()));
        }
        if old_end != Some(end) {
            self.changes
                .push(ChangeRecord::end(id, old_end, Some(end), reason));
        }
        self.enqueue(idx);
    }

    fn enqueue(&mut self, idx: usize) {
        if self.queued.insert(idx) {
            self.worklist.push_back(idx);
        }
    }

    /// Walks the containment chain above `idx`, stopping at the first
    /// container whose span is already right.
    fn propagate_up(&mut self, idx: usize) {
        let mut child = idx;
        while let Some(parent) = self.plan.parent_of(child) {
            if !self.refresh_container(parent) {
                break;
            }
            child = parent;
        }
    }

    /// Sets a container's span to the union of its children's spans.
    /// Returns whether anything changed.
    fn refresh_container(&mut self, idx: usize) -> bool {
        let (start, end) = self.plan.children_span(idx);
        let node = self.plan.node_mut(idx);
        let mut changed = false;

        if start.is_some() && start != node.start {
            self.changes.push(ChangeRecord::start(
                node.id.clone(),
                node.start,
                start,
                ChangeReason::ParentSpanAdjusted,
            ));
            node.start = start;
            changed = true;
        }
        if end.is_some() && end != node.end {
            self.changes.push(ChangeRecord::end(
                node.id.clone(),
                node.end,
                end,
                ChangeReason::ParentSpanAdjusted,
            ));
            node.end = end;
            changed = true;
        }
        if changed {
            debug!(node = %node.id, kind = node.kind.as_str(), "container span adjusted");
        }
        changed
    }

    /// Pushes siblings after `idx` so each starts on the working day
    /// after its predecessor ends.
    fn resequence_siblings(&mut self, idx: usize) -> Result<()> {
        if !self.config.resequence_siblings {
            return Ok(());
        }

        let mut siblings = self.plan.task_siblings(idx);
        siblings.sort_by_key(|&i| (self.initial_starts[i].is_none(), self.initial_starts[i], i));
        let Some(pos) = siblings.iter().position(|&i| i == idx) else {
            return Ok(());
        };

        let mut previous = idx;
        for &sibling in &siblings[pos + 1..] {
            let Some(previous_end) = self.plan.node(previous).end else {
                let message = "has no end date; later siblings were not re-sequenced";
                self.skip_task(previous, message);
                break;
            };
            let Some(current_start) = self.plan.node(sibling).start else {
                self.skip_task(sibling, "has no start date; not re-sequenced");
                continue;
            };

            let next_day = self.calendar.start_of_next_working_day(previous_end.date());
            let required = match recoverable(next_day)? {
                Ok(required) => required,
                Err(reason) => {
                    self.skip_task(sibling, &format!("not re-sequenced: {reason}"));
                    break;
                }
            };
            if required > current_start {
                let Some(hours) = self.task_hours(sibling) else {
                    self.skip_task(sibling, "has no duration or end date; not re-sequenced");
                    continue;
                };
                let reason = ChangeReason::ResequencedBySibling {
                    predecessor_id: self.plan.node(previous).id.clone(),
                };
                if let Err(reason) = recoverable(self.move_task(sibling, required, hours, reason))? {
                    self.skip_task(sibling, &format!("not re-sequenced: {reason}"));
                    break;
                }
                self.propagate_up(sibling);
            }
            previous = sibling;
        }
        Ok(())
    }

    /// Re-resolves every edge leaving `idx`.
    fn propagate_across(&mut self, idx: usize) -> Result<()> {
        let outgoing = self.graph.outgoing(&self.plan.node(idx).id).to_vec();
        for edge_idx in outgoing {
            self.apply_edge(edge_idx)?;
        }
        Ok(())
    }

    fn skip_edge(&mut self, edge_idx: usize, message: String) {
        if !self.reported_edges.insert(edge_idx) {
            return;
        }
        let edge = self.graph.edge(edge_idx);
        let subject = format!("{} -> {}", edge.origin_id, edge.dependent_id);
        self.report(Diagnostic::new(DiagnosticKind::SkippedEdge, subject, message));
    }

    fn skip_task(&mut self, idx: usize, message: &str) {
        if !self.reported_tasks.insert(idx) {
            return;
        }
        let id = self.plan.node(idx).id.clone();
        let message = format!("task '{id}' {message}");
        self.report(Diagnostic::new(DiagnosticKind::SkippedTask, id, message));
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(kind = %diagnostic.kind, subject = %diagnostic.subject, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }
}

/// Separates date-range overflow, which a run recovers from with a
/// diagnostic, from fatal errors.
fn recoverable<T>(result: Result<T>) -> Result<std::result::Result<T, String>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(PropagationError::DateOutOfRange(reason)) => Ok(Err(reason)),
        Err(err) => Err(err),
    }
}

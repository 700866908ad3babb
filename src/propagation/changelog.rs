//! Human-readable change log.
//!
//! Renders change records as audit lines in the order they were
//! produced. The order is never re-sorted: it documents the causal order
//! of the propagation.

use std::collections::HashMap;

use crate::models::{ChangeRecord, PlanNode};

/// Builder for audit lines.
#[derive(Debug, Default)]
pub struct ChangeLog<'a> {
    labels: HashMap<&'a str, (&'a str, &'a str)>,
}

impl<'a> ChangeLog<'a> {
    /// Creates a builder that renders ids only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves kinds and display names from `nodes`.
    pub fn with_nodes(mut self, nodes: &'a [PlanNode]) -> Self {
        self.labels = nodes
            .iter()
            .map(|n| (n.id.as_str(), (n.kind.as_str(), n.name.as_str())))
            .collect();
        self
    }

    /// Renders one record.
    ///
    /// `task 'Pour slab' (T7): start 2024-01-03 08:00 -> 2024-01-04 08:00 [dependency FS applied from T6]`
    pub fn line(&self, record: &ChangeRecord) -> String {
        let subject = match self.labels.get(record.node_id.as_str()) {
            Some((kind, name)) if !name.is_empty() => {
                format!("{kind} '{name}' ({})", record.node_id)
            }
            Some((kind, _)) => format!("{kind} {}", record.node_id),
            None => record.node_id.clone(),
        };
        format!(
            "{subject}: {} {} -> {} [{}]",
            record.field, record.old_value, record.new_value, record.reason
        )
    }

    /// Renders all records in insertion order.
    pub fn build(&self, records: &[ChangeRecord]) -> Vec<String> {
        records.iter().map(|r| self.line(r)).collect()
    }
}

//! Propagation run configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a propagation run.
///
/// Deserializes with defaults for missing fields, so hosts can embed it
/// in their own configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Push later sibling tasks after a moved task (one working day
    /// after their predecessor ends).
    pub resequence_siblings: bool,
    /// Maximum number of worklist tasks processed in one run. Reaching
    /// it stops the cascade with a diagnostic.
    pub max_cascade_steps: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            resequence_siblings: true,
            max_cascade_steps: 10_000,
        }
    }
}

impl PropagationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables sibling re-sequencing.
    pub fn with_sibling_resequencing(mut self, enabled: bool) -> Self {
        self.resequence_siblings = enabled;
        self
    }

    /// Sets the cascade step budget.
    pub fn with_max_cascade_steps(mut self, steps: usize) -> Self {
        self.max_cascade_steps = steps;
        self
    }
}

//! Dependency edges between tasks.
//!
//! The four classic precedence-diagram relations, each with a signed
//! lag. A positive lag delays the dependent, a negative lag (lead) lets
//! it overlap the origin.
//!
//! # Reference
//! Fondahl (1961), "A Non-Computer Approach to the Critical Path Method
//! for the Construction Industry" (precedence diagramming)

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Dependency relation between an origin and a dependent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Dependent starts after the origin finishes.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Dependent starts after the origin starts.
    #[serde(rename = "SS")]
    StartToStart,
    /// Dependent finishes after the origin finishes.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Dependent finishes after the origin starts.
    #[serde(rename = "SF")]
    StartToFinish,
}

/// Which date of the origin task a relation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginAnchor {
    Start,
    End,
}

impl OriginAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

impl RelationKind {
    /// Two-letter code (`FS`, `SS`, `FF`, `SF`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }

    /// The origin date this relation is measured from.
    pub fn origin_anchor(&self) -> OriginAnchor {
        match self {
            Self::FinishToStart | Self::FinishToFinish => OriginAnchor::End,
            Self::StartToStart | Self::StartToFinish => OriginAnchor::Start,
        }
    }

    /// Whether the relation constrains the dependent's end rather than
    /// its start.
    pub fn constrains_end(&self) -> bool {
        matches!(self, Self::FinishToFinish | Self::StartToFinish)
    }
}

/// Signed wall-clock offset, stored in whole minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lag(i64);

impl Lag {
    /// No offset.
    pub const ZERO: Lag = Lag(0);

    pub fn minutes(minutes: i64) -> Self {
        Self(minutes)
    }

    pub fn hours(hours: i64) -> Self {
        Self(hours.saturating_mul(60))
    }

    /// Calendar days of 24 hours, not working days.
    pub fn days(days: i64) -> Self {
        Self(days.saturating_mul(24 * 60))
    }

    #[inline]
    pub fn num_minutes(&self) -> i64 {
        self.0
    }

    /// The offset as a chrono delta, or `None` if it exceeds
    /// `TimeDelta`'s range.
    pub fn as_delta(&self) -> Option<TimeDelta> {
        TimeDelta::try_minutes(self.0)
    }
}

/// A dependency from an origin task to a dependent task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Task the dependency is measured from.
    pub origin_id: String,
    /// Task whose dates are constrained.
    pub dependent_id: String,
    /// Relation type.
    pub relation: RelationKind,
    /// Offset applied before calendar snapping.
    #[serde(default)]
    pub lag: Lag,
}

impl DependencyEdge {
    /// Creates a zero-lag dependency.
    pub fn new(
        origin_id: impl Into<String>,
        dependent_id: impl Into<String>,
        relation: RelationKind,
    ) -> Self {
        Self {
            origin_id: origin_id.into(),
            dependent_id: dependent_id.into(),
            relation,
            lag: Lag::ZERO,
        }
    }

    /// Creates a finish-to-start dependency.
    pub fn finish_to_start(origin_id: impl Into<String>, dependent_id: impl Into<String>) -> Self {
        Self::new(origin_id, dependent_id, RelationKind::FinishToStart)
    }

    /// Sets the lag.
    pub fn with_lag(mut self, lag: Lag) -> Self {
        self.lag = lag;
        self
    }
}

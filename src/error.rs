//! Propagation errors.
//!
//! All variants except `DateOutOfRange` are detected during validation,
//! before the working copy is touched, so a failed run never leaves
//! partial mutations behind. `DateOutOfRange` comes from calendar
//! arithmetic; inside a run it is turned into a
//! [`Diagnostic`](crate::models::Diagnostic) like the other non-fatal
//! conditions (missing dates, dangling edges).

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that abort a propagation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    /// The dependency edges form a cycle. `path` starts and ends on the
    /// same task id.
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// The working calendar cannot support date arithmetic.
    #[error("invalid calendar: {0}")]
    InvalidCalendar(String),

    /// A duration is negative or not a finite number of hours.
    /// `subject` names the task or the operation that received it.
    #[error("invalid duration for {subject}: {hours} hours")]
    InvalidDuration { subject: String, hours: f64 },

    /// The plan tree is structurally broken (duplicate ids, dangling
    /// parents, kind mismatches).
    #[error("invalid plan: {} problem(s), first: {}", .0.len(), .0.first().map(|e| e.message.as_str()).unwrap_or("-"))]
    InvalidPlan(Vec<ValidationError>),

    /// Date arithmetic left the representable range. Raised by the
    /// calendar and the resolver; the propagator recovers from it per
    /// edge or task with a diagnostic.
    #[error("date out of range: {0}")]
    DateOutOfRange(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PropagationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_cycle_message() {
        let err = PropagationError::CyclicDependency {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: A -> B -> A");
    }

    #[test]
    fn test_invalid_plan_message() {
        let err = PropagationError::InvalidPlan(vec![ValidationError::new(
            ValidationErrorKind::DuplicateId,
            "Duplicate node ID: T1",
        )]);
        assert_eq!(
            err.to_string(),
            "invalid plan: 1 problem(s), first: Duplicate node ID: T1"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = PropagationError::DateOutOfRange("no day after +262142-12-31".into());
        assert_eq!(err.to_string(), "date out of range: no day after +262142-12-31");
    }
}

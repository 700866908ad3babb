//! Hierarchical plan date propagation for the U-Engine ecosystem.
//!
//! Given a plan tree (phase → element → activity → task), a set of
//! task dependencies, and a working calendar, recomputes dates so that
//! every dependency, the calendar, and parent/child containment hold at
//! the same time. The engine is a pure function of its inputs: it
//! performs no I/O and keeps no state between calls.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WorkingCalendar`, `PlanNode`, `Plan`,
//!   `DependencyEdge`, `ChangeRecord`, `Diagnostic`
//! - **`graph`**: Dependency edge index (outgoing / incoming)
//! - **`validation`**: Input integrity checks (structure, durations, DAG cycles)
//! - **`propagation`**: The propagator, constraint resolver, milestone
//!   classifier, change log, and run summary
//!
//! # Example
//!
//! ```
//! use u_plan::models::{DependencyEdge, PlanNode, WorkingCalendar};
//! use u_plan::{propagate, PropagationError};
//!
//! let nodes = vec![
//!     PlanNode::phase("P"),
//!     PlanNode::element("E", "P"),
//!     PlanNode::activity("A", "E"),
//!     PlanNode::task("T1", "A"),
//!     PlanNode::task("T2", "A"),
//! ];
//! let edges = vec![
//!     DependencyEdge::finish_to_start("T1", "T2"),
//!     DependencyEdge::finish_to_start("T2", "T1"),
//! ];
//! let calendar = WorkingCalendar::standard("std");
//!
//! let err = propagate(&nodes, &edges, &calendar).unwrap_err();
//! assert!(matches!(err, PropagationError::CyclicDependency { .. }));
//! ```
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22

pub mod error;
pub mod graph;
pub mod models;
pub mod propagation;
pub mod validation;

pub use error::{PropagationError, Result};
pub use propagation::{propagate, PropagationConfig, PropagationOutcome, Propagator};

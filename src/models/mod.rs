//! Planning domain models.
//!
//! Provides the data types a propagation run reads and produces: the
//! working calendar, the plan tree, dependency edges, and the change
//! records describing what moved.
//!
//! # Domain Mappings
//!
//! | u-plan | Construction | Software | Events |
//! |--------|--------------|----------|--------|
//! | Phase | Project stage | Release | Season |
//! | Element | Work package | Epic | Venue |
//! | Activity | Trade activity | Story | Event day |
//! | Task | Crew task | Ticket | Setup slot |

mod calendar;
mod change;
mod dependency;
mod node;
mod plan;

pub use calendar::{Shift, WorkingCalendar, MAX_DURATION_HOURS};
pub use change::{
    ChangeField, ChangeReason, ChangeRecord, ChangeValue, Diagnostic, DiagnosticKind,
};
pub use dependency::{DependencyEdge, Lag, OriginAnchor, RelationKind};
pub use node::{NodeKind, PlanNode};
pub use plan::Plan;

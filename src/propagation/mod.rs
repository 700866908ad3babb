//! Date propagation engine.
//!
//! Recomputes task and container dates so that dependency edges, the
//! working calendar, and parent/child containment all hold. One call
//! takes a snapshot and returns a mutated copy plus an ordered audit
//! trail; nothing is retained between calls.
//!
//! # Components
//!
//! - [`resolve`]: required dependent start for one edge
//! - [`Propagator`]: validation, resolution, and the up/down/across cascade
//! - [`classify_milestones`]: post-pass milestone flags
//! - [`ChangeLog`]: human-readable audit lines
//! - [`PropagationSummary`]: run metrics
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - PMI (2017), "Practice Standard for Scheduling", Ch. 6 (precedence relationships)

mod changelog;
mod config;
mod milestone;
mod propagator;
mod resolver;
mod state;
mod summary;

pub use changelog::ChangeLog;
pub use config::PropagationConfig;
pub use milestone::{classify_milestones, is_milestone_candidate};
pub use propagator::{propagate, PropagationOutcome, Propagator};
pub use resolver::resolve;
pub use state::PropagationState;
pub use summary::PropagationSummary;

//! # timeshift-engine
//!
//! Deterministic rescheduling of a linear event history into a recurring
//! nightly window.
//!
//! Given events ordered by their original timestamps, each carrying a work
//! size, the engine assigns new timestamps that stay in order, fall inside
//! the configured window, keep a minimum pace per unit of work, and keep a
//! fraction of the original spacing. The validator re-checks any schedule
//! against the same rules, independently of the solver.
//!
//! ## Modules
//!
//! - [`config`] — Immutable run configuration and its feasibility checks
//! - [`event`] — Input events, scheduled output, rewrite mapping
//! - [`zone`] — Fixed-offset or IANA zone resolution, DST gaps and overlaps
//! - [`window`] — Night index ↔ window bounds, including midnight wrap
//! - [`solver`] — The single forward placement pass
//! - [`validator`] — Independent constraint re-check
//! - [`plan`] — Solve + validate in dry-run or strict mode
//! - [`report`] — Before/after summary for display or JSON
//! - [`error`] — Error types

pub mod config;
pub mod error;
pub mod event;
mod jitter;
pub mod plan;
pub mod report;
pub mod solver;
pub mod validator;
pub mod window;
pub mod zone;

pub use config::Config;
pub use error::ScheduleError;
pub use event::{index_events, Event, RewriteEntry, Schedule, ScheduledEvent};
pub use plan::{ensure_valid, plan, plan_strict, Plan};
pub use report::PlanReport;
pub use solver::{required_gap, solve};
pub use validator::{
    schedule_from_rewrite, validate, ConstraintKind, Measure, ValidationReport, Violation,
};
pub use window::{Window, WindowCalendar};
pub use zone::Zone;

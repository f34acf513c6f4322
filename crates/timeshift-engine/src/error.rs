//! Error types for timeshift-engine operations.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::validator::Violation;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The configuration cannot produce any schedule. Raised before any event
    /// is looked at.
    #[error("Infeasible configuration ({field}): {reason}")]
    ConfigInfeasible { field: &'static str, reason: String },

    /// The caller handed over events out of chronological order.
    #[error("Input not sorted: event {event_id} at {actual} precedes its predecessor at {previous}")]
    InputNotSorted {
        event_id: String,
        previous: DateTime<FixedOffset>,
        actual: DateTime<FixedOffset>,
    },

    /// Strict planning found a schedule that breaks at least one constraint.
    #[error("{} constraint violation(s), first: {}", .violations.len(), first_violation(.violations))]
    ConstraintViolation { violations: Vec<Violation> },

    #[error("Schedule has {actual} entries but {expected} events were supplied")]
    ScheduleMismatch { expected: usize, actual: usize },

    #[error("Schedule entry {index} is for {actual}, expected {expected}")]
    EventIdMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Timestamp arithmetic overflowed while scheduling event {event_id}")]
    TimestampOverflow { event_id: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn first_violation(violations: &[Violation]) -> String {
    violations
        .first()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

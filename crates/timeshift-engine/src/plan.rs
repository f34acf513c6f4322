//! Solve-then-validate pipeline entry points.
//!
//! [`plan`] is the dry-run path: violations are kept in the report as
//! warnings. [`plan_strict`] is the apply path: any violation is fatal, so a
//! caller can hand the schedule to a rewriter only when it returns `Ok`.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, ScheduleError};
use crate::event::{Event, Schedule};
use crate::solver::solve;
use crate::validator::{validate, ValidationReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub schedule: Schedule,
    pub validation: ValidationReport,
}

impl Plan {
    pub fn is_ok(&self) -> bool {
        self.validation.ok
    }
}

/// Solve and validate, reporting violations without failing.
///
/// # Errors
/// Propagates solver errors (`ConfigInfeasible`, `InputNotSorted`,
/// `TimestampOverflow`, `InvalidTimezone`).
pub fn plan(events: &[Event], config: &Config) -> Result<Plan> {
    let schedule = solve(events, config)?;
    let validation = validate(events, &schedule, config)?;
    Ok(Plan {
        schedule,
        validation,
    })
}

/// Solve and validate, failing on the first report with any violation.
///
/// # Errors
/// Everything [`plan`] returns, plus `ScheduleError::ConstraintViolation`
/// carrying the full violation list.
pub fn plan_strict(events: &[Event], config: &Config) -> Result<Plan> {
    let plan = plan(events, config)?;
    ensure_valid(&plan.validation)?;
    Ok(plan)
}

/// Turn a failing report into an error, for callers that must not proceed
/// past a single violation.
///
/// # Errors
/// Returns `ScheduleError::ConstraintViolation` carrying every violation in
/// report order.
pub fn ensure_valid(validation: &ValidationReport) -> Result<()> {
    if validation.ok {
        return Ok(());
    }
    Err(ScheduleError::ConstraintViolation {
        violations: validation.violations.clone(),
    })
}

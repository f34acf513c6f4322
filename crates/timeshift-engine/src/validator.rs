//! Validator: re-derive, from scratch, whether a schedule honours every
//! constraint.
//!
//! Nothing from the solver's bookkeeping is trusted. Window membership is
//! recomputed from the timestamps alone, and the pace and spacing bounds are
//! recomputed from the original events. The stored `night_index` of each
//! entry is ignored.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ScheduleError};
use crate::event::{Event, RewriteEntry, Schedule, ScheduledEvent};
use crate::window::WindowCalendar;

/// Allowance for sub-second rounding in stored timestamps.
const TOLERANCE_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Inside some nightly window.
    Window,
    /// Strictly after the previous event.
    Order,
    /// No faster than the minimum pace.
    Rate,
    /// At least the configured fraction of the original spacing.
    Distance,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 4] = [
        ConstraintKind::Window,
        ConstraintKind::Order,
        ConstraintKind::Rate,
        ConstraintKind::Distance,
    ];
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Order => "order",
            ConstraintKind::Window => "window",
            ConstraintKind::Rate => "rate",
            ConstraintKind::Distance => "distance",
        };
        f.write_str(name)
    }
}

/// A required or observed value attached to a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measure {
    Seconds {
        value: i64,
    },
    Instant {
        value: DateTime<FixedOffset>,
    },
    Window {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Seconds { value } => write!(f, "{}s", value),
            Measure::Instant { value } => write!(f, "after {}", value.to_rfc3339()),
            Measure::Window { start, end } => {
                write!(f, "[{}, {})", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub event_id: String,
    pub kind: ConstraintKind,
    pub required: Measure,
    pub actual: Measure,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {}: {} requires {}, got {}",
            self.event_id, self.kind, self.required, self.actual
        )
    }
}

/// Pass/fail count for one constraint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintTally {
    pub kind: ConstraintKind,
    pub checked: usize,
    pub failed: usize,
}

impl ConstraintTally {
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    /// In event order; within one event, in `ConstraintKind::ALL` order.
    pub violations: Vec<Violation>,
    pub summary: Vec<ConstraintTally>,
}

impl ValidationReport {
    pub fn violations_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    fn from_violations(violations: Vec<Violation>, event_count: usize) -> Self {
        let pairs = event_count.saturating_sub(1);
        let summary = ConstraintKind::ALL
            .iter()
            .map(|&kind| ConstraintTally {
                kind,
                checked: if kind == ConstraintKind::Window {
                    event_count
                } else {
                    pairs
                },
                failed: violations.iter().filter(|v| v.kind == kind).count(),
            })
            .collect();
        Self {
            ok: violations.is_empty(),
            violations,
            summary,
        }
    }
}

/// Check `schedule` against `events` under `config`.
///
/// # Errors
/// - `ScheduleError::ConfigInfeasible` / `InvalidTimezone` for a rejected
///   config.
/// - `ScheduleError::ScheduleMismatch` / `EventIdMismatch` when the schedule
///   is not aligned one-to-one with `events`.
/// - `ScheduleError::TimestampOverflow` when a timestamp lies outside every
///   window and no later window is representable.
///
/// Constraint failures are not errors here; they are listed in the report.
pub fn validate(events: &[Event], schedule: &Schedule, config: &Config) -> Result<ValidationReport> {
    config.validate()?;
    ensure_aligned(events, &schedule.entries)?;

    let Some(first) = events.first() else {
        return Ok(ValidationReport::from_violations(Vec::new(), 0));
    };
    let calendar = WindowCalendar::anchored_at(first.original_timestamp, config)?;
    let zone = calendar.zone();

    let mut violations = Vec::new();
    for (index, (event, entry)) in events.iter().zip(&schedule.entries).enumerate() {
        let at = entry.new_timestamp.with_timezone(&Utc);

        if calendar.night_of(at).is_none() {
            let nearest = calendar
                .first_window_ending_after(at, i64::MIN)
                .ok_or_else(|| ScheduleError::TimestampOverflow {
                    event_id: event.id.clone(),
                })?;
            violations.push(Violation {
                event_id: event.id.clone(),
                kind: ConstraintKind::Window,
                required: Measure::Window {
                    start: zone.stamp(nearest.start),
                    end: zone.stamp(nearest.end),
                },
                actual: Measure::Instant {
                    value: entry.new_timestamp,
                },
            });
        }

        if index > 0 {
            let previous_event = &events[index - 1];
            let previous_at = schedule.entries[index - 1].new_timestamp;
            let gap_secs = (entry.new_timestamp - previous_at).num_milliseconds() as f64 / 1000.0;

            if entry.new_timestamp <= previous_at {
                violations.push(Violation {
                    event_id: event.id.clone(),
                    kind: ConstraintKind::Order,
                    required: Measure::Instant { value: previous_at },
                    actual: Measure::Instant {
                        value: entry.new_timestamp,
                    },
                });
            }

            let pace_secs = (event.work_size as f64 * 3600.0 / config.min_rate_per_hour)
                .max(config.min_granularity.num_milliseconds() as f64 / 1000.0);
            if gap_secs < pace_secs - TOLERANCE_SECS {
                violations.push(gap_violation(event, ConstraintKind::Rate, pace_secs, gap_secs));
            }

            let original_secs = (event.original_timestamp - previous_event.original_timestamp)
                .num_milliseconds() as f64
                / 1000.0;
            let spacing_secs = original_secs * config.distance_factor;
            if gap_secs < spacing_secs - TOLERANCE_SECS {
                violations.push(gap_violation(
                    event,
                    ConstraintKind::Distance,
                    spacing_secs,
                    gap_secs,
                ));
            }
        }
    }

    for violation in &violations {
        warn!(%violation, "constraint violated");
    }
    let report = ValidationReport::from_violations(violations, events.len());
    info!(
        events = events.len(),
        violations = report.violations.len(),
        ok = report.ok,
        "validated schedule"
    );
    Ok(report)
}

/// Rebuild a schedule from a mapping read back after a rewrite, so it can be
/// fed through [`validate`] again. Night indices are recomputed; a timestamp
/// outside every window is attributed to the next window to open.
///
/// # Errors
/// - `ScheduleError::InvalidTimezone` for an unknown zone name.
/// - `ScheduleError::TimestampOverflow` for an off-window timestamp with no
///   representable window after it.
pub fn schedule_from_rewrite(
    events: &[Event],
    entries: &[RewriteEntry],
    config: &Config,
) -> Result<Schedule> {
    let Some(first) = events.first() else {
        return Ok(Schedule {
            entries: entries
                .iter()
                .map(|e| ScheduledEvent {
                    id: e.id.clone(),
                    new_timestamp: e.timestamp,
                    night_index: 0,
                })
                .collect(),
        });
    };
    let calendar = WindowCalendar::anchored_at(first.original_timestamp, config)?;
    let entries = entries
        .iter()
        .map(|e| -> Result<ScheduledEvent> {
            let at = e.timestamp.with_timezone(&Utc);
            let night_index = match calendar.night_of(at) {
                Some(night) => night,
                None => {
                    calendar
                        .first_window_ending_after(at, i64::MIN)
                        .ok_or_else(|| ScheduleError::TimestampOverflow {
                            event_id: e.id.clone(),
                        })?
                        .night_index
                }
            };
            Ok(ScheduledEvent {
                id: e.id.clone(),
                new_timestamp: e.timestamp,
                night_index,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schedule { entries })
}

fn ensure_aligned(events: &[Event], entries: &[ScheduledEvent]) -> Result<()> {
    if events.len() != entries.len() {
        return Err(ScheduleError::ScheduleMismatch {
            expected: events.len(),
            actual: entries.len(),
        });
    }
    match events
        .iter()
        .zip(entries)
        .position(|(event, entry)| event.id != entry.id)
    {
        Some(index) => Err(ScheduleError::EventIdMismatch {
            index,
            expected: events[index].id.clone(),
            actual: entries[index].id.clone(),
        }),
        None => Ok(()),
    }
}

fn gap_violation(event: &Event, kind: ConstraintKind, required: f64, actual: f64) -> Violation {
    Violation {
        event_id: event.id.clone(),
        kind,
        required: Measure::Seconds {
            value: required.ceil() as i64,
        },
        actual: Measure::Seconds {
            value: actual.floor() as i64,
        },
    }
}

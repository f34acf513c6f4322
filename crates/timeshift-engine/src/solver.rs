//! Constraint Solver: a single greedy forward pass over the history.
//!
//! Each event is placed at the earliest permitted instant that keeps, relative
//! to the previously placed event:
//!
//! - chronological order
//! - the minimum pace implied by its work size (`rate gap`)
//! - a fraction of the original spacing (`distance gap`)
//! - never less than the minimum granularity
//!
//! When that instant falls past the end of the current window the event moves
//! to the first window that is still open at or after it. Moving later only
//! adds elapsed time, so no earlier placement is ever revisited.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ScheduleError};
use crate::event::{Event, Schedule, ScheduledEvent};
use crate::jitter;
use crate::window::{Window, WindowCalendar};

/// Where one event landed and how far it had to sit from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    pub at: DateTime<Utc>,
    pub window: Window,
    pub required_gap: Duration,
}

/// Minimum spacing implied by pace alone, floored at the granularity.
pub fn rate_gap(work_size: u64, config: &Config) -> Duration {
    let secs = work_size as f64 * 3600.0 / config.min_rate_per_hour;
    ceil_seconds(secs).max(config.min_granularity)
}

/// Minimum spacing implied by the original distance between two events.
pub fn distance_gap(previous: &Event, current: &Event, config: &Config) -> Duration {
    let original = current.original_timestamp - previous.original_timestamp;
    let secs = original.num_milliseconds() as f64 / 1000.0 * config.distance_factor;
    ceil_seconds(secs)
}

/// Gap that must separate `current` from `previous` in the output.
///
/// Rounded up to whole seconds; when two bounds coincide the result is the
/// same whichever one produced it.
pub fn required_gap(previous: &Event, current: &Event, config: &Config) -> Duration {
    rate_gap(current.work_size, config)
        .max(distance_gap(previous, current, config))
        .max(config.min_granularity)
}

/// Assign a new timestamp to every event.
///
/// `events` must be sorted non-decreasing by original timestamp. The result is
/// a pure function of `(events, config)`.
///
/// # Errors
/// - `ScheduleError::ConfigInfeasible` / `InvalidTimezone` if `config` is
///   rejected; checked before any event is examined.
/// - `ScheduleError::InputNotSorted` if an event precedes its predecessor.
/// - `ScheduleError::TimestampOverflow` if a gap, or the window an event is
///   pushed into, leaves chrono's date range.
pub fn solve(events: &[Event], config: &Config) -> Result<Schedule> {
    config.validate()?;

    let Some(first) = events.first() else {
        return Ok(Schedule { entries: Vec::new() });
    };
    ensure_sorted(events)?;

    let calendar = WindowCalendar::anchored_at(first.original_timestamp, config)?;
    let placements = place_all(events, config, &calendar)?;
    let timestamps = jitter::spread(&placements, config);

    let entries: Vec<ScheduledEvent> = events
        .iter()
        .zip(placements.iter().zip(timestamps))
        .map(|(event, (placement, at))| ScheduledEvent {
            id: event.id.clone(),
            new_timestamp: calendar.zone().stamp(at),
            night_index: placement.window.night_index,
        })
        .collect();

    let schedule = Schedule { entries };
    info!(
        events = schedule.len(),
        nights = schedule.nights_used(),
        "solved schedule"
    );
    Ok(schedule)
}

fn ensure_sorted(events: &[Event]) -> Result<()> {
    match events
        .windows(2)
        .find(|pair| pair[1].original_timestamp < pair[0].original_timestamp)
    {
        Some(pair) => Err(ScheduleError::InputNotSorted {
            event_id: pair[1].id.clone(),
            previous: pair[0].original_timestamp,
            actual: pair[1].original_timestamp,
        }),
        None => Ok(()),
    }
}

/// The forward pass proper. `events` is non-empty and sorted.
pub(crate) fn place_all(
    events: &[Event],
    config: &Config,
    calendar: &WindowCalendar,
) -> Result<Vec<Placement>> {
    let opening = calendar
        .window_start(0)
        .and_then(|start| calendar.first_window_ending_after(start, 0))
        .ok_or_else(|| overflow(&events[0]))?;
    let mut cursor = Placement {
        at: opening.start,
        window: opening,
        required_gap: Duration::zero(),
    };
    let mut placements = Vec::with_capacity(events.len());
    placements.push(cursor);

    for pair in events.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let gap = required_gap(previous, current, config);
        let candidate = cursor
            .at
            .checked_add_signed(gap)
            .ok_or_else(|| overflow(current))?;

        cursor = if cursor.window.contains(candidate) {
            Placement {
                at: candidate,
                window: cursor.window,
                required_gap: gap,
            }
        } else {
            let (at, window) = calendar
                .place(candidate, cursor.window.night_index + 1)
                .ok_or_else(|| overflow(current))?;
            debug!(
                event = %current.id,
                from_night = cursor.window.night_index,
                to_night = window.night_index,
                gap_secs = gap.num_seconds(),
                "advanced window"
            );
            Placement {
                at,
                window,
                required_gap: gap,
            }
        };
        placements.push(cursor);
    }

    Ok(placements)
}

fn overflow(event: &Event) -> ScheduleError {
    ScheduleError::TimestampOverflow {
        event_id: event.id.clone(),
    }
}

fn ceil_seconds(secs: f64) -> Duration {
    if secs <= 0.0 {
        return Duration::zero();
    }
    Duration::try_seconds(secs.ceil() as i64).unwrap_or(Duration::MAX)
}

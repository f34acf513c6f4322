//! Run configuration: the nightly window, pace and spacing bounds.
//!
//! A [`Config`] is built once per run and passed by reference into every
//! component. Nothing in the engine reads defaults from anywhere else.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

pub const DEFAULT_START_HOUR: u32 = 20;
pub const DEFAULT_END_HOUR: u32 = 4;
pub const DEFAULT_MIN_RATE_PER_HOUR: f64 = 100.0;
pub const DEFAULT_DISTANCE_FACTOR: f64 = 0.5;
pub const DEFAULT_MIN_GRANULARITY_SECS: i64 = 5 * 60;

/// Immutable scheduling parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local hour at which each nightly window opens (0-23).
    pub start_hour: u32,
    /// Minute past `start_hour` at which the window opens (0-59).
    pub start_minute: u32,
    /// Local hour at which each nightly window closes (0-23).
    pub end_hour: u32,
    /// Minute past `end_hour` at which the window closes (0-59).
    pub end_minute: u32,
    /// Minimum pace in work units (lines changed) per hour. Must be > 0.
    pub min_rate_per_hour: f64,
    /// Fraction of each original gap that must survive, in (0, 1].
    pub distance_factor: f64,
    /// Smallest gap ever placed between two consecutive events.
    #[serde(rename = "min_granularity_secs", with = "duration_secs")]
    pub min_granularity: Duration,
    /// IANA zone the window is expressed in. `None` uses the fixed offset of
    /// the first event.
    pub timezone: Option<String>,
    /// Upper bound of the cosmetic forward shift applied after solving.
    /// Zero disables the pass.
    #[serde(rename = "max_jitter_secs", with = "duration_secs")]
    pub max_jitter: Duration,
    pub jitter_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            start_minute: 0,
            end_hour: DEFAULT_END_HOUR,
            end_minute: 0,
            min_rate_per_hour: DEFAULT_MIN_RATE_PER_HOUR,
            distance_factor: DEFAULT_DISTANCE_FACTOR,
            min_granularity: Duration::seconds(DEFAULT_MIN_GRANULARITY_SECS),
            timezone: None,
            max_jitter: Duration::zero(),
            jitter_seed: 0,
        }
    }
}

impl Config {
    /// Config with the given window hours and every other field at its default.
    pub fn with_hours(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
            ..Self::default()
        }
    }

    /// Local time of day at which a window opens.
    ///
    /// Only meaningful on a validated config; out-of-range fields fall back to
    /// midnight.
    pub fn window_open(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, self.start_minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Local time of day at which a window closes.
    pub fn window_close(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour, self.end_minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// A window whose open time is not before its close time runs past
    /// midnight into the next calendar day.
    pub fn wraps_midnight(&self) -> bool {
        self.window_open() >= self.window_close()
    }

    /// Wall-clock length of a window, ignoring DST transitions.
    pub fn window_length(&self) -> Duration {
        let span = self.window_close() - self.window_open();
        if self.wraps_midnight() {
            span + Duration::days(1)
        } else {
            span
        }
    }

    /// The configured IANA zone, if any.
    pub fn zone_override(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
            })
            .transpose()
    }

    /// Reject configurations that cannot produce a schedule.
    ///
    /// # Errors
    /// Returns `ScheduleError::ConfigInfeasible` naming the offending field, or
    /// `ScheduleError::InvalidTimezone` for an unknown zone name.
    pub fn validate(&self) -> Result<()> {
        check_clock("start_hour", self.start_hour, 23)?;
        check_clock("end_hour", self.end_hour, 23)?;
        check_clock("start_minute", self.start_minute, 59)?;
        check_clock("end_minute", self.end_minute, 59)?;

        if !(self.min_rate_per_hour.is_finite() && self.min_rate_per_hour > 0.0) {
            return Err(infeasible(
                "min_rate_per_hour",
                format!("must be a positive number, got {}", self.min_rate_per_hour),
            ));
        }
        if !(self.distance_factor > 0.0 && self.distance_factor <= 1.0) {
            return Err(infeasible(
                "distance_factor",
                format!("must be in (0, 1], got {}", self.distance_factor),
            ));
        }
        if self.min_granularity <= Duration::zero() {
            return Err(infeasible(
                "min_granularity",
                format!(
                    "must be positive, got {}s",
                    self.min_granularity.num_seconds()
                ),
            ));
        }
        if self.max_jitter < Duration::zero() {
            return Err(infeasible(
                "max_jitter",
                format!("must not be negative, got {}s", self.max_jitter.num_seconds()),
            ));
        }

        let window = self.window_length();
        if window <= self.min_granularity {
            return Err(infeasible(
                "min_granularity",
                format!(
                    "window {} - {} lasts {}s, which does not exceed the minimum gap of {}s",
                    self.window_open().format("%H:%M"),
                    self.window_close().format("%H:%M"),
                    window.num_seconds(),
                    self.min_granularity.num_seconds()
                ),
            ));
        }

        self.zone_override()?;
        Ok(())
    }
}

fn check_clock(field: &'static str, value: u32, max: u32) -> Result<()> {
    if value > max {
        return Err(infeasible(field, format!("must be 0-{}, got {}", max, value)));
    }
    Ok(())
}

fn infeasible(field: &'static str, reason: String) -> ScheduleError {
    ScheduleError::ConfigInfeasible { field, reason }
}

/// (De)serialize a `chrono::Duration` as whole seconds.
mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {}s", secs)))
    }
}


//! Window Calculator: where the n-th nightly window starts and ends.
//!
//! Night 0 is the window that opens on the local calendar day of the first
//! event. Night `n` opens `n` calendar days later. A window whose open time is
//! not before its close time wraps midnight and closes on the following day,
//! so consecutive windows never overlap.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::zone::Zone;

/// Consecutive empty windows a search skips before giving up. DST can empty
/// at most one night per transition.
pub const MAX_EMPTY_NIGHTS: u32 = 7;

/// One occurrence of the nightly window, half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub night_index: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True only for nights shortened to nothing by a DST transition.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Pure mapping between night indices and absolute window bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCalendar {
    zone: Zone,
    anchor: NaiveDate,
    open: NaiveTime,
    close: NaiveTime,
    wraps: bool,
}

impl WindowCalendar {
    pub fn new(config: &Config, zone: Zone, anchor: NaiveDate) -> Self {
        Self {
            zone,
            anchor,
            open: config.window_open(),
            close: config.window_close(),
            wraps: config.wraps_midnight(),
        }
    }

    /// Calendar anchored on the local day of `first`, read in the configured
    /// zone or, when none is configured, in `first`'s own offset.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidTimezone` for an unknown zone name.
    pub fn anchored_at(first: DateTime<FixedOffset>, config: &Config) -> Result<Self> {
        let zone = match config.zone_override()? {
            Some(tz) => Zone::Named(tz),
            None => Zone::Fixed(*first.offset()),
        };
        let anchor = zone.local_date(first.with_timezone(&Utc));
        Ok(Self::new(config, zone, anchor))
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Window of night `night_index`, or `None` when either bound falls
    /// outside chrono's date range.
    pub fn window(&self, night_index: i64) -> Option<Window> {
        let day = self.day(night_index)?;
        let close_day = if self.wraps {
            self.day(night_index.checked_add(1)?)?
        } else {
            day
        };
        Some(Window {
            night_index,
            start: self.zone.resolve(day.and_time(self.open))?,
            end: self.zone.resolve(close_day.and_time(self.close))?,
        })
    }

    pub fn window_start(&self, night_index: i64) -> Option<DateTime<Utc>> {
        self.window(night_index).map(|w| w.start)
    }

    pub fn window_end(&self, night_index: i64) -> Option<DateTime<Utc>> {
        self.window(night_index).map(|w| w.end)
    }

    /// The window following `window`.
    pub fn advance(&self, window: &Window) -> Option<Window> {
        self.window(window.night_index.checked_add(1)?)
    }

    /// Night whose window contains `instant`, if any.
    pub fn night_of(&self, instant: DateTime<Utc>) -> Option<i64> {
        let day = self.day_offset(instant);
        let earliest = if self.wraps { day.saturating_sub(1) } else { day };
        (earliest..=day).find(|&n| self.window(n).is_some_and(|w| w.contains(instant)))
    }

    /// First non-empty window at or after `from_night` that has not closed by
    /// `instant`.
    ///
    /// `None` when the search runs off the end of the date range, or meets
    /// more than [`MAX_EMPTY_NIGHTS`] empty windows in a row.
    pub fn first_window_ending_after(&self, instant: DateTime<Utc>, from_night: i64) -> Option<Window> {
        let mut night = from_night.max(self.day_offset(instant).saturating_sub(1));
        let mut empty_run = 0;
        loop {
            let window = self.window(night)?;
            if !window.is_empty() {
                if window.end > instant {
                    return Some(window);
                }
                empty_run = 0;
            } else {
                empty_run += 1;
                if empty_run > MAX_EMPTY_NIGHTS {
                    return None;
                }
            }
            night = night.checked_add(1)?;
        }
    }

    /// Earliest permitted instant not before `candidate`, searching from
    /// `from_night` onwards, together with the window it lies in.
    pub fn place(&self, candidate: DateTime<Utc>, from_night: i64) -> Option<(DateTime<Utc>, Window)> {
        let window = self.first_window_ending_after(candidate, from_night)?;
        Some((candidate.max(window.start), window))
    }

    fn day(&self, night_index: i64) -> Option<NaiveDate> {
        Duration::try_days(night_index).and_then(|offset| self.anchor.checked_add_signed(offset))
    }

    fn day_offset(&self, instant: DateTime<Utc>) -> i64 {
        (self.zone.local_date(instant) - self.anchor).num_days()
    }
}

//! The clock that window boundaries are read from.
//!
//! Histories record a UTC offset per event, so the default zone is the fixed
//! offset of the first event. A named IANA zone can be configured instead; its
//! local boundary times may then fall into DST transitions:
//!
//! - a boundary inside a spring-forward gap moves to the first valid local
//!   minute after the gap
//! - a boundary inside a fall-back overlap resolves to the earlier instant

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Longest DST gap probed before giving up on a local time.
const MAX_GAP_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    /// Local calendar date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
            Zone::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Map a local wall-clock time to an instant, or `None` when it falls
    /// outside the representable range.
    pub fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Fixed(offset) => earliest_or_after_gap(offset, local),
            Zone::Named(tz) => earliest_or_after_gap(tz, local),
        }
    }

    /// Render an instant with the offset in force at that moment.
    pub fn stamp(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Fixed(offset) => instant.with_timezone(offset),
            Zone::Named(tz) => {
                let offset = tz.offset_from_utc_datetime(&instant.naive_utc()).fix();
                instant.with_timezone(&offset)
            }
        }
    }
}

fn earliest_or_after_gap<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=MAX_GAP_MINUTES)
            .filter_map(|minutes| local.checked_add_signed(Duration::minutes(minutes)))
            .find_map(|probe| zone.from_local_datetime(&probe).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

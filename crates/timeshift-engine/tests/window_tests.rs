//! Tests for the Window Calculator: anchoring, midnight wrap, membership and
//! DST-shifted boundaries.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use timeshift_engine::{Config, WindowCalendar};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn utc(s: &str) -> DateTime<Utc> {
    ts(s).with_timezone(&Utc)
}

fn calendar(config: &Config, first: &str) -> WindowCalendar {
    WindowCalendar::anchored_at(ts(first), config).unwrap()
}

// ── Wrapping window (default 20:00-04:00) ───────────────────────────────────

#[test]
fn night_zero_opens_on_first_event_day() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    let w = cal.window(0).unwrap();
    assert_eq!(w.night_index, 0);
    assert_eq!(w.start, Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap());
    assert_eq!(w.end, Utc.with_ymd_and_hms(2026, 3, 3, 4, 0, 0).unwrap());
    assert_eq!(w.duration().num_hours(), 8);
}

#[test]
fn first_event_after_window_opens_still_anchors_same_day() {
    // Anchoring is by calendar day, not by "next window after the event".
    let cal = calendar(&Config::default(), "2026-03-02T23:30:00Z");
    assert_eq!(cal.window_start(0), Some(utc("2026-03-02T20:00:00Z")));
}

#[test]
fn consecutive_nights_are_one_day_apart_and_disjoint() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    for n in 0..10 {
        let this = cal.window(n).unwrap();
        let next = cal.advance(&this).unwrap();
        assert_eq!(next.night_index, n + 1);
        assert_eq!((next.start - this.start).num_hours(), 24);
        assert!(this.end <= next.start, "night {} overlaps night {}", n, n + 1);
    }
}

#[test]
fn early_morning_belongs_to_previous_night() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    assert_eq!(cal.night_of(utc("2026-03-03T02:00:00Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-02T20:00:00Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-03T21:15:00Z")), Some(1));
}

#[test]
fn window_end_is_exclusive() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    assert_eq!(cal.night_of(utc("2026-03-03T03:59:59Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-03T04:00:00Z")), None);
}

#[test]
fn daytime_is_outside_every_window() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    assert_eq!(cal.night_of(utc("2026-03-02T10:00:00Z")), None);
    assert_eq!(cal.night_of(utc("2026-03-04T12:00:00Z")), None);
}

#[test]
fn instants_before_the_anchor_get_negative_nights() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    assert_eq!(cal.night_of(utc("2026-03-01T21:00:00Z")), Some(-1));
    assert_eq!(cal.night_of(utc("2026-03-02T01:00:00Z")), Some(-1));
}

// ── Non-wrapping window ─────────────────────────────────────────────────────

#[test]
fn same_day_window_stays_on_one_day() {
    let cal = calendar(&Config::with_hours(4, 20), "2026-03-02T10:00:00Z");
    let w = cal.window(0).unwrap();
    assert_eq!(w.start, utc("2026-03-02T04:00:00Z"));
    assert_eq!(w.end, utc("2026-03-02T20:00:00Z"));
    assert_eq!(cal.night_of(utc("2026-03-02T12:00:00Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-02T21:00:00Z")), None);
    assert_eq!(cal.night_of(utc("2026-03-03T02:00:00Z")), None);
    assert_eq!(cal.night_of(utc("2026-03-03T04:00:00Z")), Some(1));
}

#[test]
fn full_day_window_covers_every_instant() {
    let cal = calendar(&Config::with_hours(6, 6), "2026-03-02T10:00:00Z");
    assert_eq!(cal.night_of(utc("2026-03-02T06:00:00Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-03T05:59:59Z")), Some(0));
    assert_eq!(cal.night_of(utc("2026-03-03T06:00:00Z")), Some(1));
}

// ── Offsets and zones ───────────────────────────────────────────────────────

#[test]
fn fixed_offset_of_first_event_sets_the_local_clock() {
    // 01:00 at +09:00 is still 2026-03-02 locally (16:00 UTC the day before).
    let cal = calendar(&Config::default(), "2026-03-02T01:00:00+09:00");
    assert_eq!(cal.anchor().to_string(), "2026-03-02");
    assert_eq!(cal.window_start(0), Some(utc("2026-03-02T20:00:00+09:00")));
    assert_eq!(cal.window_start(0), Some(utc("2026-03-02T11:00:00Z")));
}

#[test]
fn named_zone_overrides_event_offset() {
    let config = Config {
        timezone: Some("America/New_York".to_string()),
        ..Config::default()
    };
    let cal = calendar(&config, "2026-01-15T12:00:00Z");
    // 20:00 EST is 01:00 UTC the next day.
    assert_eq!(cal.window_start(0), Some(utc("2026-01-16T01:00:00Z")));
    assert_eq!(cal.window_end(0), Some(utc("2026-01-16T09:00:00Z")));
}

#[test]
fn spring_forward_gap_moves_window_open_past_the_gap() {
    // 2026-03-08 02:00 does not exist in New York; clocks jump to 03:00 EDT.
    let config = Config {
        timezone: Some("America/New_York".to_string()),
        ..Config::with_hours(2, 5)
    };
    let cal = calendar(&config, "2026-03-07T12:00:00-05:00");

    let before = cal.window(0).unwrap();
    assert_eq!(before.start, utc("2026-03-07T07:00:00Z"));
    assert_eq!(before.end, utc("2026-03-07T10:00:00Z"));

    let shifted = cal.window(1).unwrap();
    assert_eq!(shifted.start, utc("2026-03-08T07:00:00Z"));
    assert_eq!(shifted.end, utc("2026-03-08T09:00:00Z"));
    assert_eq!(shifted.duration().num_hours(), 2);
}

#[test]
fn fall_back_overlap_resolves_to_earliest_instant() {
    // 2026-11-01 01:00 happens twice in New York; the EDT reading wins.
    let config = Config {
        timezone: Some("America/New_York".to_string()),
        ..Config::with_hours(1, 3)
    };
    let cal = calendar(&config, "2026-11-01T00:30:00-04:00");
    let w = cal.window(0).unwrap();
    assert_eq!(w.start, utc("2026-11-01T05:00:00Z"));
    assert_eq!(w.end, utc("2026-11-01T08:00:00Z"));
    assert_eq!(w.duration().num_hours(), 3);
}

#[test]
fn stamp_uses_offset_in_force_at_the_instant() {
    let config = Config {
        timezone: Some("Europe/Berlin".to_string()),
        ..Config::default()
    };
    let cal = calendar(&config, "2026-03-27T12:00:00Z");
    let winter = cal.zone().stamp(utc("2026-03-27T20:00:00Z"));
    let summer = cal.zone().stamp(utc("2026-03-30T20:00:00Z"));
    assert_eq!(winter.offset().local_minus_utc(), 3600);
    assert_eq!(summer.offset().local_minus_utc(), 7200);
}

// ── Placement ───────────────────────────────────────────────────────────────

#[test]
fn place_moves_daytime_candidate_to_next_window_start() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    let (at, window) = cal.place(utc("2026-03-03T05:00:00Z"), 1).unwrap();
    assert_eq!(window.night_index, 1);
    assert_eq!(at, utc("2026-03-03T20:00:00Z"));
}

#[test]
fn place_keeps_candidate_already_inside_a_later_window() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    let (at, window) = cal.place(utc("2026-03-05T22:30:00Z"), 1).unwrap();
    assert_eq!(window.night_index, 3);
    assert_eq!(at, utc("2026-03-05T22:30:00Z"));
}

#[test]
fn first_window_ending_after_respects_lower_bound() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    // 21:00 on day 0 is inside night 0, but night 0 is excluded.
    let w = cal.first_window_ending_after(utc("2026-03-02T21:00:00Z"), 1).unwrap();
    assert_eq!(w.night_index, 1);
}

// ── Edge of the date range ──────────────────────────────────────────────────

#[test]
fn nights_beyond_the_date_range_have_no_window() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    let last = (NaiveDate::MAX - cal.anchor()).num_days();
    // The last night would close on a day chrono cannot represent.
    assert!(cal.window(last - 1).is_some());
    assert!(cal.window(last).is_none());
    assert!(cal.window(i64::MAX).is_none());
    assert!(cal.window(i64::MIN).is_none());
}

#[test]
fn search_past_the_last_window_gives_up() {
    let cal = calendar(&Config::default(), "2026-03-02T10:00:00Z");
    let noon = NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap().and_utc();
    assert_eq!(cal.night_of(noon), None);
    assert!(cal.first_window_ending_after(noon, 0).is_none());
    assert!(cal.first_window_ending_after(noon, i64::MIN).is_none());
    assert!(cal.place(noon, 1).is_none());
}

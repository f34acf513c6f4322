//! Tests for configuration defaults, feasibility checks and serialization.

use chrono::Duration;
use timeshift_engine::config::{Config, DEFAULT_END_HOUR};
use timeshift_engine::ScheduleError;

#[test]
fn default_window_wraps_midnight_for_eight_hours() {
    let config = Config::default();
    assert!(config.wraps_midnight());
    assert_eq!(config.window_length(), Duration::hours(8));
    assert_eq!(config.min_granularity, Duration::minutes(5));
    assert!(config.validate().is_ok());
}

#[test]
fn same_day_window_does_not_wrap() {
    let config = Config::with_hours(4, 20);
    assert!(!config.wraps_midnight());
    assert_eq!(config.window_length(), Duration::hours(16));
}

#[test]
fn equal_hours_give_a_full_day_window() {
    let config = Config::with_hours(6, 6);
    assert!(config.wraps_midnight());
    assert_eq!(config.window_length(), Duration::hours(24));
    assert!(config.validate().is_ok());
}

#[test]
fn minutes_shorten_the_window() {
    let config = Config {
        end_hour: 20,
        end_minute: 20,
        ..Config::with_hours(20, 20)
    };
    assert!(!config.wraps_midnight());
    assert_eq!(config.window_length(), Duration::minutes(20));
}

#[test]
fn window_not_longer_than_granularity_is_infeasible() {
    // 20:00-20:20 cannot hold a 30 minute minimum gap.
    let config = Config {
        end_hour: 20,
        end_minute: 20,
        min_granularity: Duration::minutes(30),
        ..Config::with_hours(20, 20)
    };
    match config.validate() {
        Err(ScheduleError::ConfigInfeasible { field, reason }) => {
            assert_eq!(field, "min_granularity");
            assert!(reason.contains("20:00 - 20:20"), "reason was: {}", reason);
        }
        other => panic!("expected ConfigInfeasible, got {:?}", other),
    }
}

#[test]
fn rejects_out_of_range_fields() {
    let bad = [
        ("start_hour", Config::with_hours(24, 4)),
        ("end_hour", Config::with_hours(20, 30)),
        (
            "start_minute",
            Config {
                start_minute: 60,
                ..Config::default()
            },
        ),
        (
            "min_rate_per_hour",
            Config {
                min_rate_per_hour: 0.0,
                ..Config::default()
            },
        ),
        (
            "min_rate_per_hour",
            Config {
                min_rate_per_hour: f64::NAN,
                ..Config::default()
            },
        ),
        (
            "distance_factor",
            Config {
                distance_factor: 1.5,
                ..Config::default()
            },
        ),
        (
            "distance_factor",
            Config {
                distance_factor: 0.0,
                ..Config::default()
            },
        ),
        (
            "min_granularity",
            Config {
                min_granularity: Duration::zero(),
                ..Config::default()
            },
        ),
        (
            "max_jitter",
            Config {
                max_jitter: Duration::seconds(-1),
                ..Config::default()
            },
        ),
    ];
    for (expected_field, config) in bad {
        match config.validate() {
            Err(ScheduleError::ConfigInfeasible { field, .. }) => {
                assert_eq!(field, expected_field, "wrong field for {:?}", config)
            }
            other => panic!("expected {:?} to be rejected, got {:?}", config, other),
        }
    }
}

#[test]
fn distance_factor_of_one_is_allowed() {
    let config = Config {
        distance_factor: 1.0,
        ..Config::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn unknown_timezone_is_rejected() {
    let config = Config {
        timezone: Some("Mars/Olympus_Mons".to_string()),
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ScheduleError::InvalidTimezone(ref name)) if name == "Mars/Olympus_Mons"
    ));
}

#[test]
fn known_timezone_is_accepted() {
    let config = Config {
        timezone: Some("Europe/Berlin".to_string()),
        ..Config::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.zone_override().unwrap(), Some(chrono_tz::Europe::Berlin));
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let config: Config =
        serde_json::from_str(r#"{"start_hour": 21, "min_granularity_secs": 600}"#).unwrap();
    assert_eq!(config.start_hour, 21);
    assert_eq!(config.end_hour, DEFAULT_END_HOUR);
    assert_eq!(config.min_granularity, Duration::minutes(10));
    assert_eq!(config.max_jitter, Duration::zero());
}

#[test]
fn json_uses_whole_second_fields() {
    let json = serde_json::to_value(Config::default()).unwrap();
    assert_eq!(json["min_granularity_secs"], 300);
    assert_eq!(json["max_jitter_secs"], 0);
    assert_eq!(json["start_hour"], 20);
}

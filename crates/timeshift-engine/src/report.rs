//! Before/after report for a planned rewrite.
//!
//! The report is plain data (`Serialize`) so callers can emit it as JSON, and
//! implements `Display` for the human-readable dry-run summary. `{}` shows the
//! first few changes; `{:#}` shows every change.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::event::{Event, Schedule};
use crate::plan::Plan;
use crate::validator::{ConstraintKind, ConstraintTally, ValidationReport, Violation};

/// Rows printed by the non-alternate `Display`.
pub const SAMPLE_ROWS: usize = 5;

const RULE_WIDTH: usize = 60;
const SHORT_ID_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub seconds: i64,
}

impl Span {
    fn between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            start,
            end,
            seconds: (end - start).num_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRow {
    pub id: String,
    pub original: DateTime<FixedOffset>,
    pub adjusted: DateTime<FixedOffset>,
    /// `adjusted - original`, in seconds.
    pub delta_secs: i64,
    pub work_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// Whether the schedule will only be shown, not handed to a rewriter.
    pub dry_run: bool,
    pub config: Config,
    pub total_events: usize,
    /// Events turned away by the history reader for branching/merging.
    pub rejected_nonlinear: usize,
    pub original_span: Option<Span>,
    pub adjusted_span: Option<Span>,
    pub nights_used: usize,
    pub changes: Vec<ChangeRow>,
    pub constraints: Vec<ConstraintTally>,
    pub violations: Vec<Violation>,
}

impl PlanReport {
    /// Dry-run report for a freshly computed plan.
    pub fn new(events: &[Event], plan: &Plan, config: &Config) -> Self {
        Self::from_validation(events, &plan.schedule, &plan.validation, config)
    }

    /// Report for any schedule that has been through the validator, including
    /// one read back after a rewrite.
    pub fn from_validation(
        events: &[Event],
        schedule: &Schedule,
        validation: &ValidationReport,
        config: &Config,
    ) -> Self {
        let changes: Vec<ChangeRow> = events
            .iter()
            .zip(&schedule.entries)
            .map(|(event, entry)| ChangeRow {
                id: event.id.clone(),
                original: event.original_timestamp,
                adjusted: entry.new_timestamp,
                delta_secs: (entry.new_timestamp - event.original_timestamp).num_seconds(),
                work_size: event.work_size,
            })
            .collect();

        let original_span = match (events.first(), events.last()) {
            (Some(first), Some(last)) => {
                Some(Span::between(first.original_timestamp, last.original_timestamp))
            }
            _ => None,
        };
        let adjusted_span = match (schedule.entries.first(), schedule.entries.last()) {
            (Some(first), Some(last)) => Some(Span::between(first.new_timestamp, last.new_timestamp)),
            _ => None,
        };

        Self {
            dry_run: true,
            config: config.clone(),
            total_events: events.len(),
            rejected_nonlinear: 0,
            original_span,
            adjusted_span,
            nights_used: schedule.nights_used(),
            changes,
            constraints: validation.summary.clone(),
            violations: validation.violations.clone(),
        }
    }

    pub fn with_rejected_nonlinear(mut self, count: usize) -> Self {
        self.rejected_nonlinear = count;
        self
    }

    pub fn applying(mut self) -> Self {
        self.dry_run = false;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn tally(&self, kind: ConstraintKind) -> Option<&ConstraintTally> {
        self.constraints.iter().find(|t| t.kind == kind)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = &self.config;

        write!(f, "Timestamp Adjustment")?;
        if self.dry_run {
            write!(f, " - Dry Run")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        writeln!(f, "\nConfiguration:")?;
        writeln!(
            f,
            "  Window: {} - {} ({})",
            config.window_open().format("%H:%M"),
            config.window_close().format("%H:%M"),
            config.timezone.as_deref().unwrap_or("first event's offset")
        )?;
        writeln!(f, "  Minimum rate: {} units/hour", config.min_rate_per_hour)?;
        writeln!(f, "  Distance factor: {}", config.distance_factor)?;
        writeln!(f, "  Minimum gap: {}", format_duration(config.min_granularity))?;
        if config.max_jitter > Duration::zero() {
            writeln!(
                f,
                "  Jitter: up to {} (seed {})",
                format_duration(config.max_jitter),
                config.jitter_seed
            )?;
        }

        writeln!(f, "\nAnalysis:")?;
        writeln!(f, "  Total events: {}", self.total_events)?;
        writeln!(f, "  Rejected (non-linear): {}", self.rejected_nonlinear)?;
        if let Some(span) = &self.original_span {
            writeln!(f, "  Original span: {}", render_span(span))?;
        }
        if let Some(span) = &self.adjusted_span {
            writeln!(f, "  Adjusted span: {}", render_span(span))?;
        }
        writeln!(f, "  Nights used: {}", self.nights_used)?;

        if !self.changes.is_empty() {
            let shown = if f.alternate() {
                self.changes.len()
            } else {
                SAMPLE_ROWS.min(self.changes.len())
            };
            writeln!(f, "\nChanges:")?;
            for row in &self.changes[..shown] {
                writeln!(
                    f,
                    "  {}: {} -> {} ({} units, {})",
                    short_id(&row.id),
                    row.original.format("%Y-%m-%d %H:%M"),
                    row.adjusted.format("%Y-%m-%d %H:%M"),
                    row.work_size,
                    format_signed(Duration::seconds(row.delta_secs))
                )?;
            }
            if shown < self.changes.len() {
                writeln!(f, "  ... and {} more events", self.changes.len() - shown)?;
            }
        }

        writeln!(f, "\nConstraints:")?;
        for tally in &self.constraints {
            let mark = if tally.passed() { "✓" } else { "✗" };
            writeln!(
                f,
                "  {} {}: {}/{} passed",
                mark,
                tally.kind,
                tally.checked - tally.failed,
                tally.checked
            )?;
        }
        if !self.violations.is_empty() {
            writeln!(f, "\nViolations:")?;
            for violation in &self.violations {
                writeln!(f, "  - {}", violation)?;
            }
        }

        let verb = if self.dry_run { "Would rewrite" } else { "Will rewrite" };
        write!(
            f,
            "\n{} {} events across {} nights.",
            verb, self.total_events, self.nights_used
        )
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn render_span(span: &Span) -> String {
    format!(
        "{} to {} ({})",
        span.start.format("%Y-%m-%d %H:%M"),
        span.end.format("%Y-%m-%d %H:%M"),
        format_duration(Duration::seconds(span.seconds))
    )
}

/// Compact `1d02h05m` style rendering of a non-negative duration. Sub-minute
/// durations are shown in seconds.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().abs();
    if total < 60 {
        return format!("{}s", total);
    }
    let (days, hours, minutes) = (total / 86_400, (total % 86_400) / 3600, (total % 3600) / 60);
    if days > 0 {
        format!("{}d{:02}h{:02}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h{:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn format_signed(duration: Duration) -> String {
    let sign = if duration < Duration::zero() { "-" } else { "+" };
    format!("{}{}", sign, format_duration(duration))
}

//! Reading the commit log produced by the history reader.
//!
//! The log is a JSON array, oldest first:
//!
//! ```json
//! [{"id": "3f2a…", "timestamp": "2026-03-02T10:00:00+01:00",
//!   "additions": 120, "deletions": 4, "parents": ["9be0…"]}]
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use timeshift_engine::{Event, RewriteEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl CommitRecord {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn work_size(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

/// A parsed log split into schedulable events and rejected merge commits.
#[derive(Debug)]
pub struct History {
    pub events: Vec<Event>,
    pub merges: Vec<CommitRecord>,
}

pub fn parse_history(json: &str) -> Result<History> {
    let records: Vec<CommitRecord> =
        serde_json::from_str(json).context("Failed to parse commit log JSON")?;

    let (merges, linear): (Vec<_>, Vec<_>) = records.into_iter().partition(CommitRecord::is_merge);
    let events = linear
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let work_size = record.work_size();
            Event::new(record.id, record.timestamp, work_size, index)
        })
        .collect();

    Ok(History { events, merges })
}

pub fn parse_mapping(json: &str) -> Result<Vec<RewriteEntry>> {
    serde_json::from_str(json).context("Failed to parse rewrite mapping JSON")
}

/// Human-readable list of merge commits, one per line.
pub fn describe_merges(merges: &[CommitRecord]) -> String {
    merges
        .iter()
        .map(|m| {
            let short: String = m.id.chars().take(7).collect();
            format!("  - {} ({})", short, m.timestamp.format("%Y-%m-%d"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Events going into the solver and the schedule coming out of it.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One entry of a linear history, as supplied by the history reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque, stable identifier (a commit hash for git histories).
    pub id: String,
    pub original_timestamp: DateTime<FixedOffset>,
    /// Lines added plus lines deleted.
    pub work_size: u64,
    /// 0-based position in the history.
    pub sequence_index: usize,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        original_timestamp: DateTime<FixedOffset>,
        work_size: u64,
        sequence_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            original_timestamp,
            work_size,
            sequence_index,
        }
    }
}

/// Build a sequence-indexed event list from `(id, timestamp, work_size)` rows.
pub fn index_events<I, S>(rows: I) -> Vec<Event>
where
    I: IntoIterator<Item = (S, DateTime<FixedOffset>, u64)>,
    S: Into<String>,
{
    rows.into_iter()
        .enumerate()
        .map(|(index, (id, timestamp, work_size))| Event::new(id, timestamp, work_size, index))
        .collect()
}

/// The new timestamp assigned to one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: String,
    pub new_timestamp: DateTime<FixedOffset>,
    /// Night the timestamp was placed in, relative to the anchor day.
    pub night_index: i64,
}

/// Solver output: one entry per input event, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub entries: Vec<ScheduledEvent>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct nights the schedule occupies, in whatever order
    /// they appear.
    pub fn nights_used(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.night_index)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Mapping handed to the history rewriter: every event keeps its id and
    /// gets `timestamp` as both its authored and its recorded time.
    pub fn rewrite_entries(&self) -> Vec<RewriteEntry> {
        self.entries
            .iter()
            .map(|e| RewriteEntry {
                id: e.id.clone(),
                timestamp: e.new_timestamp,
            })
            .collect()
    }
}

/// One line of the rewrite mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteEntry {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
}

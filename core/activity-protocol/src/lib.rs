//! Shared activity-slot record format for the idle-session sentinel.
//!
//! Every context (window, tab, process) participating in idle tracking reads
//! and writes the same storage slot. This crate is shared by all of them to
//! prevent schema drift: any context can publish a record that every other
//! context built against the same format version can consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the record shape changes incompatibly. Readers skip
/// records carrying an unknown version instead of guessing.
pub const SLOT_FORMAT_VERSION: u32 = 1;

/// The single value stored in the shared activity slot.
///
/// Overwrite-only, last-writer-wins: contexts never read-modify-write, so
/// concurrent writers race safely and the highest timestamp logically wins
/// regardless of write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityRecord {
    pub version: u32,
    /// Identity of the writing context. Readers use it to ignore their own
    /// writes; a context must never treat its own publish as a notification.
    pub context_id: String,
    /// RFC 3339 UTC timestamp of the most recent recognized activity.
    pub last_activity_at: String,
}

impl ActivityRecord {
    pub fn new(context_id: &str, last_activity_at: DateTime<Utc>) -> Self {
        Self {
            version: SLOT_FORMAT_VERSION,
            context_id: context_id.to_string(),
            last_activity_at: last_activity_at.to_rfc3339(),
        }
    }

    /// Parses the embedded timestamp. `None` when the stored value is not
    /// valid RFC 3339 (a foreign or corrupted writer).
    pub fn activity_time(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.last_activity_at)
    }
}

pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

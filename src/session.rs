use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::format::format_duration;

/// Identifier of a completed session, serialized as a bare JSON number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One completed start-to-stop interval.
///
/// The duration strings are derived once at construction and stored with the
/// record, so history renders the same way even if formatting changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub start_time: u64,
    pub end_time: u64,
    pub duration_display: String,
    pub duration_hours: String,
}

impl Session {
    /// Build a session; an `end_ms` before `start_ms` is clamped to the start.
    pub fn new(id: SessionId, start_ms: u64, end_ms: u64) -> Self {
        let end_ms = end_ms.max(start_ms);
        let formatted = format_duration(end_ms - start_ms);
        Self {
            id,
            start_time: start_ms,
            end_time: end_ms,
            duration_display: formatted.display,
            duration_hours: formatted.hours_decimal,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn started_at_local(&self) -> Option<DateTime<Local>> {
        local_datetime(self.start_time)
    }

    pub fn ended_at_local(&self) -> Option<DateTime<Local>> {
        local_datetime(self.end_time)
    }
}

pub fn local_datetime(epoch_ms: u64) -> Option<DateTime<Local>> {
    let ms = i64::try_from(epoch_ms).ok()?;
    Local.timestamp_millis_opt(ms).single()
}

/// Hands out strictly increasing ids that track the wall clock.
///
/// Each id is `max(now_ms, previous + 1)`: close to the creation time in
/// epoch milliseconds, yet never repeated within a process even when two
/// sessions complete in the same millisecond or the clock steps backwards.
#[derive(Debug, Clone, Default)]
pub struct SessionIdGenerator {
    last: Option<u64>,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id`
    pub fn observe(&mut self, id: SessionId) {
        self.last = Some(self.last.map_or(id.0, |last| last.max(id.0)));
    }

    pub fn next_id(&mut self, now_ms: u64) -> SessionId {
        let raw = match self.last {
            // ids stop growing at u64::MAX rather than wrapping
            Some(last) if now_ms <= last => last.saturating_add(1),
            _ => now_ms,
        };
        self.last = Some(raw);
        SessionId(raw)
    }
}

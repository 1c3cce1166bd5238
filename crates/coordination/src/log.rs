// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only log primitive: `append`/`read_range`/`tail`, with
//! MAXLEN trimming on append and a bounded-block tail for cooperative
//! cancellation.

use crate::error::CoordinationError;
use async_trait::async_trait;
use std::time::Duration;

/// An opaque, lexicographically-ordered log position. Two positions from
/// the same key are comparable; positions from different keys are not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogPosition(pub String);

impl LogPosition {
    pub fn new(raw: impl Into<String>) -> Self {
        LogPosition(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LogPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry read back from a log: its position plus the flat
/// `[key, value, key, value, ...]` field list it was appended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub position: LogPosition,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The append-only log contract required from the coordination store.
#[async_trait]
pub trait CoordinationLog: Send + Sync + 'static {
    /// Appends `fields` to `key`, trimming the log to approximately
    /// `maxlen_hint` entries, and returns the new entry's position.
    async fn append(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        maxlen_hint: u64,
    ) -> Result<LogPosition, CoordinationError>;

    /// Reads up to `count` entries from `key`, starting after `from`
    /// (or from the beginning if `None`), oldest first.
    async fn read_range(
        &self,
        key: &str,
        from: Option<&LogPosition>,
        count: usize,
    ) -> Result<Vec<LogRecord>, CoordinationError>;

    /// Blocks for up to `block` waiting for entries newer than `after`
    /// (or from the beginning if `None`) to appear on `key`, then returns
    /// whatever arrived (possibly empty, if the block timed out).
    async fn tail(
        &self,
        key: &str,
        after: Option<&LogPosition>,
        block: Duration,
    ) -> Result<Vec<LogRecord>, CoordinationError>;
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

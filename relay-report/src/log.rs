// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log entries attached to report items.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Severity of a log entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Debug-level detail.
    Debug,

    /// Informational output.
    Info,

    /// A warning.
    Warn,

    /// An error; used for failure diagnostics.
    Error,
}

/// A log entry attached to a report item.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity of the entry.
    pub level: LogLevel,

    /// The time at which the entry was emitted.
    pub timestamp: DateTime<FixedOffset>,

    /// The message body (e.g. a rendered failure trace).
    pub message: String,
}

impl LogEntry {
    /// Creates an [`LogLevel::Error`] entry with the given timestamp and
    /// message.
    pub fn error(timestamp: DateTime<FixedOffset>, message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            timestamp,
            message: message.into(),
        }
    }
}

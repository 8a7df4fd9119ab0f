// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire-shaped specifications for sessions and items.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{collections::BTreeSet, fmt};

/// The remote item type derived for a node.
///
/// Serialized forms are the reporting protocol's type strings (`"SUITE"`,
/// `"BEFORE_CLASS"`, ...).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// A container node: suite, class, or template container.
    Suite,

    /// An individual test case or dynamic invocation.
    Step,

    /// A before-all fixture guarding a container.
    BeforeClass,

    /// A before-each fixture guarding a test.
    BeforeMethod,

    /// An after-each fixture guarding a test.
    AfterMethod,

    /// An after-all fixture guarding a container.
    AfterClass,
}

/// Terminal status of an item or a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The unit completed successfully.
    Passed,

    /// The unit failed, or a child within its scope failed.
    Failed,

    /// The unit was skipped or disabled.
    Skipped,
}

impl Status {
    /// Returns true if this status is [`Status::Failed`].
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Passed => "PASSED",
            Status::Failed => "FAILED",
            Status::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// Specification for starting a report item.
///
/// Produced by the observer; the name is at most 256 characters (longer names
/// are truncated by the caller before the spec is built).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Display name of the item.
    pub name: String,

    /// Optional description (skip reason, source name, ...).
    pub description: Option<String>,

    /// The item type.
    pub item_type: ItemType,

    /// Declared tags.
    pub tags: BTreeSet<SmolStr>,

    /// The node's unique identity string within the run.
    pub unique_id: String,

    /// Whether this item is a retry of an earlier one. Always false in this
    /// design.
    pub retry: bool,

    /// The time at which the item started.
    pub start_time: DateTime<FixedOffset>,
}

/// Terminal outcome shipped when finishing an item or a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSpec {
    /// The terminal status.
    pub status: Status,

    /// The time at which the unit finished.
    pub end_time: DateTime<FixedOffset>,
}

/// The running mode of a session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    /// A regular session, visible in the default views.
    #[default]
    Default,

    /// A debug session, kept out of the default views.
    Debug,
}

/// Specification for opening a reporting session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionSpec {
    /// The run name.
    pub name: String,

    /// Optional run description.
    pub description: Option<String>,

    /// The running mode.
    pub mode: SessionMode,

    /// Tags attached to the whole run.
    pub tags: BTreeSet<SmolStr>,

    /// The time at which the run started.
    pub start_time: DateTime<FixedOffset>,
}

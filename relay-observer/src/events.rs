// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle notifications delivered by the host test runner.
//!
//! Events are produced by the host runner's listener glue and consumed by a
//! [`RunObserver`](crate::RunObserver). The host guarantees per-node ordering
//! (entered before execution-starting before finished) but events for
//! different nodes may interleave or race across worker threads.

use crate::{errors::DisplayErrorChain, identity::NodeIdentity};
use chrono::{DateTime, FixedOffset, Local};
use relay_report::ItemType;
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// A lifecycle notification for one node.
#[derive(Clone, Debug)]
pub struct NodeEvent {
    /// The time at which the notification was observed, including the offset
    /// from UTC.
    pub timestamp: DateTime<FixedOffset>,

    /// The kind of notification this is.
    pub kind: NodeEventKind,
}

impl NodeEvent {
    /// Creates an event stamped with the current local time.
    pub fn now(kind: NodeEventKind) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            kind,
        }
    }
}

/// The kind of lifecycle notification.
#[derive(Clone, Debug)]
pub enum NodeEventKind {
    /// A node was entered. Containers get their remote item started
    /// immediately; test nodes defer their item to [`ExecutionStarting`],
    /// but have their template container synthesized here if needed.
    ///
    /// [`ExecutionStarting`]: NodeEventKind::ExecutionStarting
    Entered {
        /// The node that was entered.
        node: NodeDescriptor,
    },

    /// A test node is about to execute its body (its before-each fixtures
    /// have run).
    ExecutionStarting {
        /// The node about to execute.
        node: NodeDescriptor,
    },

    /// A node finished with the given local outcome.
    Finished {
        /// The node that finished.
        node: NodeDescriptor,
        /// How execution ended locally.
        outcome: ExecutionOutcome,
    },

    /// A node was skipped (disabled) instead of executed.
    Skipped {
        /// The node that was skipped.
        node: NodeDescriptor,
        /// The skip reason, if the runner supplied one.
        reason: Option<String>,
    },
}

/// Whether a node is a container or an individual test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A suite, class, or other grouping node.
    Container,

    /// An individual test case or dynamic invocation.
    Test,
}

/// Static description of a node, supplied by the host runner.
#[derive(Clone, Debug)]
pub struct NodeDescriptor {
    /// The node's unique identity within the run.
    pub id: NodeIdentity,

    /// Identity of the node's structural parent, absent for a run root.
    pub parent_id: Option<NodeIdentity>,

    /// Human-readable display name.
    pub display_name: String,

    /// Stable source-level name (class/method reference), used as the default
    /// description.
    pub source_name: Option<String>,

    /// Tags declared on the node.
    pub tags: BTreeSet<SmolStr>,

    /// Container or test.
    pub kind: NodeKind,
}

impl NodeDescriptor {
    /// Creates a descriptor with the display name derived from the identity's
    /// last segment, no parent, no tags.
    pub fn new(id: NodeIdentity, kind: NodeKind) -> Self {
        let display_name = id.segment_name().to_owned();
        Self {
            id,
            parent_id: None,
            display_name,
            source_name: None,
            tags: BTreeSet::new(),
            kind,
        }
    }

    /// Sets the structural parent.
    pub fn with_parent(mut self, parent_id: NodeIdentity) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Overrides the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the source-level name.
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    /// Sets the declared tags.
    pub fn with_tags(mut self, tags: BTreeSet<SmolStr>) -> Self {
        self.tags = tags;
        self
    }
}

/// Setup/teardown phases intercepted around a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FixturePhase {
    /// Runs once before all tests of a container.
    BeforeAll,

    /// Runs before each test.
    BeforeEach,

    /// Runs after each test.
    AfterEach,

    /// Runs once after all tests of a container.
    AfterAll,
}

impl FixturePhase {
    /// The marker used inside synthesized fixture identities.
    pub(crate) fn marker(self) -> &'static str {
        match self {
            FixturePhase::BeforeAll => "before-all",
            FixturePhase::BeforeEach => "before-each",
            FixturePhase::AfterEach => "after-each",
            FixturePhase::AfterAll => "after-all",
        }
    }

    /// The remote item type for a fixture in this phase.
    pub(crate) fn item_type(self) -> ItemType {
        match self {
            FixturePhase::BeforeAll => ItemType::BeforeClass,
            FixturePhase::BeforeEach => ItemType::BeforeMethod,
            FixturePhase::AfterEach => ItemType::AfterMethod,
            FixturePhase::AfterAll => ItemType::AfterClass,
        }
    }
}

/// A fixture interception point.
#[derive(Clone, Debug)]
pub struct FixtureSpec<'a> {
    /// Identity of the enclosing node the fixture guards; the synthesized
    /// fixture item is nested under it.
    pub parent_id: NodeIdentity,

    /// The fixture phase.
    pub phase: FixturePhase,

    /// Name of the fixture method, without parentheses.
    pub method_name: &'a str,
}

/// How a node's execution ended locally.
#[derive(Clone, Debug)]
pub enum ExecutionOutcome {
    /// The node completed successfully.
    Passed,

    /// The node failed.
    Failed {
        /// The failure, if a failure object was available.
        failure: Option<Failure>,
    },

    /// The node was aborted (assumption violation, run cancellation).
    Aborted {
        /// The failure, if a failure object was available.
        failure: Option<Failure>,
    },
}

impl ExecutionOutcome {
    /// A failed outcome rendered from an error and its source chain.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        ExecutionOutcome::Failed {
            failure: Some(Failure::from_error(error)),
        }
    }

    /// True if the node completed successfully.
    pub fn is_passed(&self) -> bool {
        matches!(self, ExecutionOutcome::Passed)
    }

    /// The failure attached to this outcome, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ExecutionOutcome::Passed => None,
            ExecutionOutcome::Failed { failure } | ExecutionOutcome::Aborted { failure } => {
                failure.as_ref()
            }
        }
    }
}

/// A rendered local failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    /// One-line failure message.
    pub message: String,

    /// Fully rendered trace (error chain), if available.
    pub trace: Option<String>,
}

impl Failure {
    /// Renders an error and its source chain into a failure.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self {
            message: error.to_string(),
            trace: Some(DisplayErrorChain::new(error).to_string()),
        }
    }

    /// Creates a failure from a plain message, with no trace.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }

    /// The text shipped in the diagnostic log: the trace when available, the
    /// message otherwise.
    pub(crate) fn rendered(&self) -> &str {
        self.trace.as_deref().unwrap_or(&self.message)
    }
}

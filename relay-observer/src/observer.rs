// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lifecycle translator.
//!
//! [`RunObserver`] receives ordered lifecycle notifications from the host
//! test runner and mirrors them onto a remote reporting session: one remote
//! item per local node, nested the way the local tree is nested, finished
//! with a status derived from the local outcome.

use crate::{
    config::ObserverConfig,
    describe::{DefaultDescriber, ItemDescriber},
    errors::{DisplayErrorChain, ObserverError},
    events::{
        ExecutionOutcome, Failure, FixtureSpec, NodeDescriptor, NodeEvent, NodeEventKind, NodeKind,
    },
    helpers::truncate_name,
    identity::NodeIdentity,
    outcome::{emit_failure_log, terminal_status},
    session::{SessionRegistry, SessionState},
    tracker::ItemTracker,
};
use chrono::{DateTime, FixedOffset, Local};
use relay_report::{ItemHandle, ItemSpec, ItemType, OutcomeSpec, Status};
use std::{collections::BTreeSet, fmt, sync::Arc};
use tracing::{debug, warn};

/// Per-worker execution context, threaded through every observer call.
///
/// Holds the disabled-test flag for the node currently being processed on
/// this worker. Each worker thread owns its own context, so concurrent
/// siblings cannot clobber each other's skip state; the flag is reset at
/// every node entry and consulted only when computing terminal status.
#[derive(Clone, Debug, Default)]
pub struct WorkerContext {
    disabled_test: bool,
}

impl WorkerContext {
    /// Creates a fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the node currently processed on this context was disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled_test
    }
}

/// Mirrors a test run's lifecycle onto a remote reporting session.
///
/// One observer instance serves a whole run (or several runs sharing a
/// [`SessionRegistry`]); its entry points are safe to invoke concurrently for
/// unrelated nodes. Reporting failures are swallowed — only a session that
/// cannot be opened surfaces, once, to the first node start.
pub struct RunObserver<D = DefaultDescriber> {
    registry: Arc<SessionRegistry>,
    config: ObserverConfig,
    tracker: ItemTracker,
    describer: D,
}

impl<D> fmt::Debug for RunObserver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunObserver")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl RunObserver<DefaultDescriber> {
    /// Creates an observer with the default item describer.
    pub fn new(registry: Arc<SessionRegistry>, config: ObserverConfig) -> Self {
        Self::with_describer(registry, config, DefaultDescriber)
    }
}

impl<D: ItemDescriber> RunObserver<D> {
    /// Creates an observer with a custom item describer.
    pub fn with_describer(
        registry: Arc<SessionRegistry>,
        config: ObserverConfig,
        describer: D,
    ) -> Self {
        Self {
            registry,
            config,
            tracker: ItemTracker::new(),
            describer,
        }
    }

    /// The observer's configuration.
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Number of starts that fell back to root level because the parent
    /// handle was not tracked.
    ///
    /// A nonzero value indicates the host delivered events out of
    /// parent-before-child order (or a parent start failed earlier); each
    /// occurrence is also logged at warn level.
    pub fn orphan_fallbacks(&self) -> u64 {
        self.tracker.orphan_fallbacks()
    }

    /// Processes one lifecycle notification.
    ///
    /// Returns an error only if the run's reporting session could not be
    /// opened; every other reporting failure is logged and swallowed.
    pub fn report_event(
        &self,
        ctx: &mut WorkerContext,
        event: NodeEvent,
    ) -> Result<(), ObserverError> {
        let NodeEvent { timestamp, kind } = event;
        match kind {
            NodeEventKind::Entered { node } => self.node_entered(ctx, &node, timestamp),
            NodeEventKind::ExecutionStarting { node } => self.execution_starting(&node, timestamp),
            NodeEventKind::Finished { node, outcome } => {
                self.node_finished(ctx, &node, &outcome, timestamp)
            }
            NodeEventKind::Skipped { node, reason } => {
                self.node_skipped(ctx, &node, reason.as_deref(), timestamp)
            }
        }
    }

    /// Mirrors a fixture invocation around the host's `proceed` continuation.
    ///
    /// The fixture is reported as a synthetic child item of the node it
    /// guards: started immediately before `proceed` runs and finished
    /// immediately after, regardless of outcome. A failure is reported
    /// (FAILED status plus a diagnostic log) and then returned unchanged, so
    /// the host runner's own failure semantics are preserved. Reporting
    /// trouble — including an unopenable session — never prevents `proceed`
    /// from running.
    pub fn observe_fixture<T, E, F>(&self, fixture: FixtureSpec<'_>, proceed: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        let start_time = Local::now().fixed_offset();
        let fixture_id = fixture.parent_id.fixture(fixture.phase, fixture.method_name);
        let session = match self.session_for(&fixture.parent_id, start_time) {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(node = %fixture_id, %error, "reporting session unavailable for fixture");
                None
            }
        };
        let handle = session
            .as_ref()
            .and_then(|session| self.start_fixture(session, &fixture, &fixture_id, start_time));

        let result = proceed();

        if let (Some(session), Some(handle)) = (&session, &handle) {
            let end_time = Local::now().fixed_offset();
            self.tracker.remove(&fixture_id);
            match &result {
                Ok(_) => {
                    self.finish_item(
                        session,
                        &fixture_id,
                        handle,
                        Status::Passed,
                        Some(&fixture.parent_id),
                        end_time,
                    );
                }
                Err(error) => {
                    let outcome = ExecutionOutcome::Failed {
                        failure: Some(Failure {
                            message: error.to_string(),
                            trace: Some(DisplayErrorChain::new(error).to_string()),
                        }),
                    };
                    emit_failure_log(session.session(), handle, &outcome, end_time);
                    self.finish_item(
                        session,
                        &fixture_id,
                        handle,
                        Status::Failed,
                        Some(&fixture.parent_id),
                        end_time,
                    );
                }
            }
        }
        result
    }

    // ---
    // Event handling
    // ---

    fn node_entered(
        &self,
        ctx: &mut WorkerContext,
        node: &NodeDescriptor,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(), ObserverError> {
        ctx.disabled_test = false;
        let session = self.session_for(&node.id, timestamp)?;
        match node.kind {
            NodeKind::Container => {
                self.start_node(&session, node, ItemType::Suite, None, timestamp);
            }
            NodeKind::Test => {
                // The test's own item starts at execution time; entering only
                // synthesizes the template container if this is the first
                // invocation observed under one.
                self.ensure_template_container(&session, node, timestamp);
            }
        }
        Ok(())
    }

    fn execution_starting(
        &self,
        node: &NodeDescriptor,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(), ObserverError> {
        let session = self.session_for(&node.id, timestamp)?;
        self.start_node(&session, node, item_type_for(node.kind), None, timestamp);
        Ok(())
    }

    fn node_finished(
        &self,
        ctx: &mut WorkerContext,
        node: &NodeDescriptor,
        outcome: &ExecutionOutcome,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(), ObserverError> {
        let session = self.session_for(&node.id, timestamp)?;
        if node.kind == NodeKind::Container {
            // The container's after-phase is over; any template containers
            // fanned out under it are complete and can be closed.
            self.finish_templates(ctx, &session, timestamp);
        }
        self.finish_node(ctx, &session, node, outcome, timestamp);
        if node.parent_id.is_none() {
            session.finish(timestamp);
        }
        Ok(())
    }

    fn node_skipped(
        &self,
        ctx: &mut WorkerContext,
        node: &NodeDescriptor,
        reason: Option<&str>,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(), ObserverError> {
        if !self.config.report_disabled_tests() {
            return Ok(());
        }
        ctx.disabled_test = true;
        let session = self.session_for(&node.id, timestamp)?;
        let description = reason
            .filter(|reason| !reason.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| node.display_name.clone());
        self.start_node(
            &session,
            node,
            item_type_for(node.kind),
            Some(description),
            timestamp,
        );
        self.finish_node(ctx, &session, node, &ExecutionOutcome::Passed, timestamp);
        Ok(())
    }

    // ---
    // Start/finish plumbing
    // ---

    fn session_for(
        &self,
        id: &NodeIdentity,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Arc<SessionState>, ObserverError> {
        let run_id = id.root();
        self.registry
            .get_or_create(&run_id, &self.config.session_spec(timestamp))
    }

    /// Resolves the remote handle to start `id`'s item under.
    ///
    /// A node with no declared parent is a root item (`None`). When a parent
    /// is declared but its handle is not tracked — the host delivered events
    /// out of parent-before-child order, or the parent's start failed — the
    /// start falls back to root level, records an orphan fallback, and warns.
    fn resolve_parent(
        &self,
        id: &NodeIdentity,
        parent_id: Option<&NodeIdentity>,
    ) -> Option<ItemHandle> {
        let parent_id = parent_id?;
        match self.tracker.get(parent_id) {
            Some(handle) => Some(handle),
            None => {
                self.tracker.record_orphan_fallback();
                warn!(node = %id, "parent item not tracked; starting item at root level");
                None
            }
        }
    }

    fn start_node(
        &self,
        session: &SessionState,
        node: &NodeDescriptor,
        item_type: ItemType,
        description_override: Option<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Option<ItemHandle> {
        if self.tracker.get(&node.id).is_some() {
            debug!(node = %node.id, "item already started; ignoring duplicate start");
            return None;
        }
        let details = self.describer.describe(node);
        let parent = self.resolve_parent(&node.id, node.parent_id.as_ref());
        let spec = ItemSpec {
            name: truncate_name(details.name),
            description: description_override.or(details.description),
            item_type,
            tags: details.tags,
            unique_id: node.id.as_str().to_owned(),
            retry: false,
            start_time: timestamp,
        };
        match session.session().start_item(parent.as_ref(), spec) {
            Ok(handle) => {
                session.record_started();
                self.tracker.insert(node.id.clone(), handle.clone());
                Some(handle)
            }
            Err(error) => {
                warn!(node = %node.id, %error, "failed to start report item");
                None
            }
        }
    }

    fn start_fixture(
        &self,
        session: &SessionState,
        fixture: &FixtureSpec<'_>,
        fixture_id: &NodeIdentity,
        timestamp: DateTime<FixedOffset>,
    ) -> Option<ItemHandle> {
        let parent = self.resolve_parent(fixture_id, Some(&fixture.parent_id));
        let spec = ItemSpec {
            name: truncate_name(format!("{}()", fixture.method_name)),
            description: Some(fixture.method_name.to_owned()),
            item_type: fixture.phase.item_type(),
            tags: BTreeSet::new(),
            unique_id: fixture_id.as_str().to_owned(),
            retry: false,
            start_time: timestamp,
        };
        match session.session().start_item(parent.as_ref(), spec) {
            Ok(handle) => {
                session.record_started();
                self.tracker.insert(fixture_id.clone(), handle.clone());
                Some(handle)
            }
            Err(error) => {
                warn!(node = %fixture_id, %error, "failed to start fixture item");
                None
            }
        }
    }

    /// Synthesizes the SUITE item for a template container the first time one
    /// of its invocations is observed. The presence check and the start call
    /// are atomic, so concurrent invocations start the container at most
    /// once.
    fn ensure_template_container(
        &self,
        session: &SessionState,
        node: &NodeDescriptor,
        timestamp: DateTime<FixedOffset>,
    ) {
        let Some(container_id) = &node.parent_id else {
            return;
        };
        if !container_id.is_template_container() {
            return;
        }
        let result = self.tracker.ensure_with(container_id, |parent| {
            if parent.is_none() && container_id.parent_path().is_some() {
                self.tracker.record_orphan_fallback();
                warn!(
                    node = %container_id,
                    "parent item not tracked; starting template container at root level"
                );
            }
            let spec = ItemSpec {
                name: truncate_name(container_id.segment_name().to_owned()),
                description: None,
                item_type: ItemType::Suite,
                tags: node.tags.clone(),
                unique_id: container_id.as_str().to_owned(),
                retry: false,
                start_time: timestamp,
            };
            session.session().start_item(parent, spec)
        });
        match result {
            Ok(Some(_)) => session.record_started(),
            Ok(None) => {}
            Err(error) => {
                warn!(node = %container_id, %error, "failed to start template container item");
            }
        }
    }

    fn finish_node(
        &self,
        ctx: &WorkerContext,
        session: &SessionState,
        node: &NodeDescriptor,
        outcome: &ExecutionOutcome,
        timestamp: DateTime<FixedOffset>,
    ) {
        let Some(tracked) = self.tracker.remove(&node.id) else {
            debug!(node = %node.id, "finish for an item that was never started; skipping");
            return;
        };
        let mut status = terminal_status(outcome, ctx.disabled_test);
        // Rollup: a scope with a failed child cannot finish PASSED.
        if status == Status::Passed && tracked.child_failed {
            status = Status::Failed;
        }
        // The diagnostic log is tied to the node's own failure; rollup
        // promotion does not fabricate one.
        if status == Status::Failed && !outcome.is_passed() {
            emit_failure_log(session.session(), &tracked.handle, outcome, timestamp);
        }
        self.finish_item(
            session,
            &node.id,
            &tracked.handle,
            status,
            node.parent_id.as_ref(),
            timestamp,
        );
    }

    fn finish_templates(
        &self,
        ctx: &WorkerContext,
        session: &SessionState,
        timestamp: DateTime<FixedOffset>,
    ) {
        for (id, tracked) in self.tracker.drain_templates() {
            let status = if ctx.disabled_test {
                Status::Skipped
            } else if tracked.child_failed {
                Status::Failed
            } else {
                Status::Passed
            };
            self.finish_item(
                session,
                &id,
                &tracked.handle,
                status,
                id.parent_path().as_ref(),
                timestamp,
            );
        }
    }

    fn finish_item(
        &self,
        session: &SessionState,
        id: &NodeIdentity,
        handle: &ItemHandle,
        status: Status,
        parent_id: Option<&NodeIdentity>,
        timestamp: DateTime<FixedOffset>,
    ) {
        let outcome = OutcomeSpec {
            status,
            end_time: timestamp,
        };
        if let Err(error) = session.session().finish_item(handle, outcome) {
            warn!(node = %id, %error, "failed to finish report item");
        }
        session.record_finished(status);
        if status.is_failed() {
            if let Some(parent_id) = parent_id {
                self.tracker.mark_child_failed(parent_id);
            }
        }
    }
}

fn item_type_for(kind: NodeKind) -> ItemType {
    match kind {
        NodeKind::Container => ItemType::Suite,
        NodeKind::Test => ItemType::Step,
    }
}

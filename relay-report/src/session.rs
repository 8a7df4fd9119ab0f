// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side traits for the reporting service.

use crate::{
    errors::{ReportError, SessionOpenError},
    handle::ItemHandle,
    ids::SessionUuid,
    items::{ItemSpec, OutcomeSpec, SessionSpec},
    log::LogEntry,
};
use std::sync::Arc;

/// Entry point to a reporting service.
///
/// One session is opened per test run; exactly-once creation is the caller's
/// concern (the observer's session registry handles it).
pub trait ReportClient: Send + Sync {
    /// Opens a new reporting session.
    fn open_session(&self, spec: &SessionSpec) -> Result<Arc<dyn ReportSession>, SessionOpenError>;
}

/// An open reporting session.
///
/// Every operation is non-blocking: it enqueues work for the transport and
/// returns immediately. [`start_item`][Self::start_item] returns an
/// [`ItemHandle`] before the server has acknowledged the item; confirmation
/// (and handle resolution) happens out-of-band.
pub trait ReportSession: Send + Sync {
    /// The client-side id assigned to this session at open time.
    fn session_uuid(&self) -> SessionUuid;

    /// Starts a report item, nested under `parent` when given, at session root
    /// otherwise.
    fn start_item(
        &self,
        parent: Option<&ItemHandle>,
        spec: ItemSpec,
    ) -> Result<ItemHandle, ReportError>;

    /// Finishes a previously started item.
    fn finish_item(&self, handle: &ItemHandle, outcome: OutcomeSpec) -> Result<(), ReportError>;

    /// Attaches a log entry to a previously started item.
    fn emit_log(&self, handle: &ItemHandle, entry: LogEntry) -> Result<(), ReportError>;

    /// Finishes the session itself. Finishing twice is an error.
    fn finish_session(&self, outcome: OutcomeSpec) -> Result<(), ReportError>;
}

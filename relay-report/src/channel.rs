// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A reporting client that queues requests for an out-of-band transport.

use crate::{
    errors::{ReportError, SessionOpenError},
    handle::ItemHandle,
    ids::{ItemUuid, SessionUuid},
    items::{ItemSpec, OutcomeSpec, SessionSpec},
    log::LogEntry,
    session::{ReportClient, ReportSession},
};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// A queued request to the reporting transport.
///
/// The transport that drains the request stream owns the wire protocol:
/// serialization, authentication, retries and the resolution of item handles
/// against server-assigned ids all live there.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReportRequest {
    /// Open a session.
    OpenSession {
        /// Client-side session id.
        session: SessionUuid,
        /// The session specification.
        spec: SessionSpec,
    },

    /// Start an item within a session.
    StartItem {
        /// The session the item belongs to.
        session: SessionUuid,
        /// Client-side id of the new item.
        item: ItemUuid,
        /// Client-side id of the parent item, if any.
        parent: Option<ItemUuid>,
        /// The item specification.
        spec: ItemSpec,
    },

    /// Finish a previously started item.
    FinishItem {
        /// The session the item belongs to.
        session: SessionUuid,
        /// Client-side id of the item.
        item: ItemUuid,
        /// The terminal outcome.
        outcome: OutcomeSpec,
    },

    /// Attach a log entry to a previously started item.
    EmitLog {
        /// The session the item belongs to.
        session: SessionUuid,
        /// Client-side id of the item.
        item: ItemUuid,
        /// The log entry.
        entry: LogEntry,
    },

    /// Finish the session.
    FinishSession {
        /// The session to finish.
        session: SessionUuid,
        /// The terminal outcome.
        outcome: OutcomeSpec,
    },
}

/// A [`ReportClient`] that enqueues [`ReportRequest`] values on an unbounded
/// channel.
///
/// Start/finish/log calls return as soon as the request is queued; a
/// transport task drains the receiver out-of-band. Enqueueing never blocks.
#[derive(Clone, Debug)]
pub struct ChannelClient {
    tx: UnboundedSender<ReportRequest>,
}

impl ChannelClient {
    /// Creates a client along with the receiver the transport drains.
    pub fn new() -> (Self, UnboundedReceiver<ReportRequest>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReportClient for ChannelClient {
    fn open_session(&self, spec: &SessionSpec) -> Result<Arc<dyn ReportSession>, SessionOpenError> {
        let session = SessionUuid::new_v4();
        self.tx
            .send(ReportRequest::OpenSession {
                session,
                spec: spec.clone(),
            })
            .map_err(|_| SessionOpenError::ChannelClosed)?;
        Ok(Arc::new(ChannelSession {
            uuid: session,
            tx: self.tx.clone(),
            finished: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug)]
struct ChannelSession {
    uuid: SessionUuid,
    tx: UnboundedSender<ReportRequest>,
    finished: AtomicBool,
}

impl ChannelSession {
    fn send(&self, request: ReportRequest) -> Result<(), ReportError> {
        self.tx.send(request).map_err(|_| ReportError::ChannelClosed)
    }
}

impl ReportSession for ChannelSession {
    fn session_uuid(&self) -> SessionUuid {
        self.uuid
    }

    fn start_item(
        &self,
        parent: Option<&ItemHandle>,
        spec: ItemSpec,
    ) -> Result<ItemHandle, ReportError> {
        let handle = ItemHandle::new();
        self.send(ReportRequest::StartItem {
            session: self.uuid,
            item: handle.uuid(),
            parent: parent.map(ItemHandle::uuid),
            spec,
        })?;
        Ok(handle)
    }

    fn finish_item(&self, handle: &ItemHandle, outcome: OutcomeSpec) -> Result<(), ReportError> {
        self.send(ReportRequest::FinishItem {
            session: self.uuid,
            item: handle.uuid(),
            outcome,
        })
    }

    fn emit_log(&self, handle: &ItemHandle, entry: LogEntry) -> Result<(), ReportError> {
        self.send(ReportRequest::EmitLog {
            session: self.uuid,
            item: handle.uuid(),
            entry,
        })
    }

    fn finish_session(&self, outcome: OutcomeSpec) -> Result<(), ReportError> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(ReportError::SessionFinished);
        }
        self.send(ReportRequest::FinishSession {
            session: self.uuid,
            outcome,
        })
    }
}

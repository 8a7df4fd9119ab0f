// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory reporting client that records every operation.
//!
//! This is the test double for the observer's integration suite, and a
//! ready-made fake for embedders' own tests. Operations are recorded as
//! [`ReportRequest`] values in global call order.

use crate::{
    channel::ReportRequest,
    errors::{ReportError, SessionOpenError},
    handle::ItemHandle,
    ids::SessionUuid,
    items::{ItemSpec, OutcomeSpec, SessionSpec},
    log::LogEntry,
    session::{ReportClient, ReportSession},
};
use debug_ignore::DebugIgnore;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

#[derive(Debug, Default)]
struct RecorderShared {
    ops: DebugIgnore<Mutex<Vec<ReportRequest>>>,
    reject_open: AtomicBool,
    fail_ops: AtomicBool,
}

impl RecorderShared {
    fn record(&self, request: ReportRequest) -> Result<(), ReportError> {
        if self.fail_ops.load(Ordering::SeqCst) {
            return Err(ReportError::Transport("injected failure".into()));
        }
        self.ops.lock().unwrap().push(request);
        Ok(())
    }
}

/// A [`ReportClient`] that records operations into a shared in-memory buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingClient {
    shared: Arc<RecorderShared>,
}

impl RecordingClient {
    /// Creates a new recording client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose `open_session` always fails.
    pub fn rejecting() -> Self {
        let client = Self::new();
        client.shared.reject_open.store(true, Ordering::SeqCst);
        client
    }

    /// When set, subsequent item operations fail, exercising the observer's
    /// best-effort paths. Recording resumes once cleared.
    pub fn set_fail_ops(&self, fail: bool) {
        self.shared.fail_ops.store(fail, Ordering::SeqCst);
    }

    /// A snapshot of the recorded operations, in call order.
    pub fn recorded(&self) -> Vec<ReportRequest> {
        self.shared.ops.lock().unwrap().clone()
    }
}

impl ReportClient for RecordingClient {
    fn open_session(&self, spec: &SessionSpec) -> Result<Arc<dyn ReportSession>, SessionOpenError> {
        if self.shared.reject_open.load(Ordering::SeqCst) {
            return Err(SessionOpenError::Rejected {
                name: spec.name.clone(),
                reason: "injected rejection".to_owned(),
            });
        }
        let session = SessionUuid::new_v4();
        self.shared
            .record(ReportRequest::OpenSession {
                session,
                spec: spec.clone(),
            })
            .map_err(|_| SessionOpenError::ChannelClosed)?;
        Ok(Arc::new(RecordingSession {
            uuid: session,
            shared: self.shared.clone(),
            finished: AtomicBool::new(false),
        }))
    }
}

/// A session produced by [`RecordingClient`].
#[derive(Debug)]
pub struct RecordingSession {
    uuid: SessionUuid,
    shared: Arc<RecorderShared>,
    finished: AtomicBool,
}

impl ReportSession for RecordingSession {
    fn session_uuid(&self) -> SessionUuid {
        self.uuid
    }

    fn start_item(
        &self,
        parent: Option<&ItemHandle>,
        spec: ItemSpec,
    ) -> Result<ItemHandle, ReportError> {
        let handle = ItemHandle::new();
        self.shared.record(ReportRequest::StartItem {
            session: self.uuid,
            item: handle.uuid(),
            parent: parent.map(ItemHandle::uuid),
            spec,
        })?;
        Ok(handle)
    }

    fn finish_item(&self, handle: &ItemHandle, outcome: OutcomeSpec) -> Result<(), ReportError> {
        self.shared.record(ReportRequest::FinishItem {
            session: self.uuid,
            item: handle.uuid(),
            outcome,
        })
    }

    fn emit_log(&self, handle: &ItemHandle, entry: LogEntry) -> Result<(), ReportError> {
        self.shared.record(ReportRequest::EmitLog {
            session: self.uuid,
            item: handle.uuid(),
            entry,
        })
    }

    fn finish_session(&self, outcome: OutcomeSpec) -> Result<(), ReportError> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(ReportError::SessionFinished);
        }
        self.shared.record(ReportRequest::FinishSession {
            session: self.uuid,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemType, SessionMode, Status};
    use chrono::{FixedOffset, TimeZone};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn timestamp() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 11, 3, 12, 0, 0)
            .unwrap()
    }

    fn session_spec() -> SessionSpec {
        SessionSpec {
            name: "run".to_owned(),
            description: None,
            mode: SessionMode::Default,
            tags: BTreeSet::new(),
            start_time: timestamp(),
        }
    }

    #[test]
    fn records_operations_in_order() {
        let client = RecordingClient::new();
        let session = client.open_session(&session_spec()).unwrap();
        let handle = session
            .start_item(
                None,
                ItemSpec {
                    name: "suite".to_owned(),
                    description: None,
                    item_type: ItemType::Suite,
                    tags: BTreeSet::new(),
                    unique_id: "[root]".to_owned(),
                    retry: false,
                    start_time: timestamp(),
                },
            )
            .unwrap();
        session
            .finish_item(
                &handle,
                OutcomeSpec {
                    status: Status::Passed,
                    end_time: timestamp(),
                },
            )
            .unwrap();

        let ops = client.recorded();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], ReportRequest::OpenSession { .. }));
        assert!(matches!(
            &ops[1],
            ReportRequest::StartItem { parent: None, .. }
        ));
        assert!(matches!(ops[2], ReportRequest::FinishItem { .. }));
    }

    #[test]
    fn rejecting_client_fails_open() {
        let client = RecordingClient::rejecting();
        assert!(matches!(
            client.open_session(&session_spec()),
            Err(SessionOpenError::Rejected { .. })
        ));
        assert!(client.recorded().is_empty());
    }

    #[test]
    fn fail_ops_surfaces_transport_errors() {
        let client = RecordingClient::new();
        let session = client.open_session(&session_spec()).unwrap();
        client.set_fail_ops(true);
        let result = session.start_item(
            None,
            ItemSpec {
                name: "t".to_owned(),
                description: None,
                item_type: ItemType::Step,
                tags: BTreeSet::new(),
                unique_id: "[root]/[method:t()]".to_owned(),
                retry: false,
                start_time: timestamp(),
            },
        );
        assert!(matches!(result, Err(ReportError::Transport(_))));
        // Only the open was recorded.
        assert_eq!(client.recorded().len(), 1);
    }
}

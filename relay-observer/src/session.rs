// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-run session registry.
//!
//! One reporting session exists per test run, keyed by the run's root
//! identity. The registry is an explicit object with its lifetime tied to the
//! run scope — create one per run, or share one via [`Arc`] across several
//! observer instances mirroring the same process.

use crate::{errors::ObserverError, identity::NodeIdentity, stats::RunStats};
use chrono::{DateTime, FixedOffset, Local};
use relay_report::{OutcomeSpec, ReportClient, ReportSession, SessionSpec, Status};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::warn;

/// State for one open reporting session.
pub(crate) struct SessionState {
    session: Arc<dyn ReportSession>,
    finished: AtomicBool,
    stats: Mutex<RunStats>,
}

impl SessionState {
    fn new(session: Arc<dyn ReportSession>) -> Self {
        Self {
            session,
            finished: AtomicBool::new(false),
            stats: Mutex::new(RunStats::default()),
        }
    }

    /// The underlying reporting session.
    pub(crate) fn session(&self) -> &dyn ReportSession {
        &*self.session
    }

    pub(crate) fn record_started(&self) {
        self.stats.lock().unwrap().on_started();
    }

    pub(crate) fn record_finished(&self, status: Status) {
        self.stats.lock().unwrap().on_finished(status);
    }

    /// A snapshot of the session's statistics.
    pub(crate) fn stats(&self) -> RunStats {
        *self.stats.lock().unwrap()
    }

    /// Finishes the session exactly once, with the aggregate status derived
    /// from its statistics. Later calls are no-ops. Best-effort: a finish
    /// failure is warned about and swallowed.
    pub(crate) fn finish(&self, end_time: DateTime<FixedOffset>) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        let outcome = OutcomeSpec {
            status: self.stats().aggregate_status(),
            end_time,
        };
        if let Err(error) = self.session.finish_session(outcome) {
            warn!(session = %self.session.session_uuid(), %error, "failed to finish reporting session");
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("session", &self.session.session_uuid())
            .field("finished", &self.finished.load(Ordering::SeqCst))
            .field("stats", &self.stats())
            .finish()
    }
}

/// Cache of reporting sessions, one per test run.
///
/// Exactly one session is created per run root, even under concurrent
/// first-access from multiple worker threads: creation happens under the
/// registry lock, and all callers observe the same instance. Dropping the
/// registry performs a best-effort finish of every still-open session, which
/// is the recovery path when a run is abandoned mid-flight.
pub struct SessionRegistry {
    client: Arc<dyn ReportClient>,
    sessions: Mutex<HashMap<NodeIdentity, Arc<SessionState>>>,
}

impl SessionRegistry {
    /// Creates a registry backed by the given reporting client.
    pub fn new(client: Arc<dyn ReportClient>) -> Self {
        Self {
            client,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `run_id`, opening it if this is the first
    /// access.
    ///
    /// An open failure propagates to the caller — the first node start for a
    /// run is the point where a rejected session surfaces.
    pub(crate) fn get_or_create(
        &self,
        run_id: &NodeIdentity,
        spec: &SessionSpec,
    ) -> Result<Arc<SessionState>, ObserverError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(state) = sessions.get(run_id) {
            return Ok(Arc::clone(state));
        }
        let session =
            self.client
                .open_session(spec)
                .map_err(|error| ObserverError::SessionOpen {
                    run_id: run_id.as_str().to_owned(),
                    error,
                })?;
        let state = Arc::new(SessionState::new(session));
        sessions.insert(run_id.clone(), Arc::clone(&state));
        Ok(state)
    }

    /// Best-effort finish of every still-open session.
    ///
    /// Safe to call more than once; sessions already finished through the
    /// normal root-node path are skipped.
    pub fn finalize_all(&self) {
        let sessions: Vec<_> = {
            let map = self.sessions.lock().unwrap();
            map.values().cloned().collect()
        };
        let end_time = Local::now().fixed_offset();
        for state in sessions {
            state.finish(end_time);
        }
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.finalize_all();
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sessions = self.sessions.lock().unwrap();
        f.debug_struct("SessionRegistry")
            .field("sessions", &sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use relay_report::{RecordingClient, ReportRequest, SessionMode};
    use std::collections::BTreeSet;

    fn spec() -> SessionSpec {
        SessionSpec {
            name: "run".to_owned(),
            description: None,
            mode: SessionMode::Default,
            tags: BTreeSet::new(),
            start_time: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2025, 11, 3, 12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn concurrent_first_access_creates_one_session() {
        let client = RecordingClient::new();
        let registry = Arc::new(SessionRegistry::new(Arc::new(client.clone())));
        let run_id = NodeIdentity::new("[engine:junit]");

        let mut workers = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let run_id = run_id.clone();
            workers.push(std::thread::spawn(move || {
                registry.get_or_create(&run_id, &spec()).unwrap();
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }

        let opens = client
            .recorded()
            .into_iter()
            .filter(|op| matches!(op, ReportRequest::OpenSession { .. }))
            .count();
        assert_eq!(opens, 1);
    }

    #[test]
    fn open_failure_propagates() {
        let registry = SessionRegistry::new(Arc::new(RecordingClient::rejecting()));
        let result = registry.get_or_create(&NodeIdentity::new("[engine:junit]"), &spec());
        assert!(matches!(
            result,
            Err(ObserverError::SessionOpen { .. })
        ));
    }

    #[test]
    fn drop_finalizes_open_sessions_once() {
        let client = RecordingClient::new();
        {
            let registry = SessionRegistry::new(Arc::new(client.clone()));
            let state = registry
                .get_or_create(&NodeIdentity::new("[engine:junit]"), &spec())
                .unwrap();
            // Normal path already finished this session; drop must not finish
            // it again.
            state.finish(Local::now().fixed_offset());
        }
        let finishes = client
            .recorded()
            .into_iter()
            .filter(|op| matches!(op, ReportRequest::FinishSession { .. }))
            .count();
        assert_eq!(finishes, 1);

        let client = RecordingClient::new();
        {
            let registry = SessionRegistry::new(Arc::new(client.clone()));
            registry
                .get_or_create(&NodeIdentity::new("[engine:junit]"), &spec())
                .unwrap();
            // Abandoned run: never finished through the normal path.
        }
        let finishes = client
            .recorded()
            .into_iter()
            .filter(|op| matches!(op, ReportRequest::FinishSession { .. }))
            .count();
        assert_eq!(finishes, 1);
    }
}

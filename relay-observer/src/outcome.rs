// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal status computation and failure diagnostics.

use crate::events::ExecutionOutcome;
use chrono::{DateTime, FixedOffset};
use relay_report::{ItemHandle, LogEntry, ReportSession, Status};
use tracing::warn;

/// Shipped when a node failed but no failure object was available.
pub(crate) const FAILURE_FALLBACK_MESSAGE: &str = "Test has failed without exception";

/// Computes the terminal status for a node.
///
/// A disabled node is SKIPPED unconditionally; otherwise the local outcome
/// decides: no failure means PASSED, a failure or abort means FAILED.
pub(crate) fn terminal_status(outcome: &ExecutionOutcome, disabled: bool) -> Status {
    if disabled {
        return Status::Skipped;
    }
    match outcome {
        ExecutionOutcome::Passed => Status::Passed,
        ExecutionOutcome::Failed { .. } | ExecutionOutcome::Aborted { .. } => Status::Failed,
    }
}

/// Ships the diagnostic log entry for a failed node.
///
/// Exactly one ERROR entry per failure, carrying the rendered trace or the
/// fixed fallback text. Fire-and-forget: an emission failure is warned about
/// and otherwise ignored, so it can neither change the computed status nor
/// abort finishing the node.
pub(crate) fn emit_failure_log(
    session: &dyn ReportSession,
    handle: &ItemHandle,
    outcome: &ExecutionOutcome,
    timestamp: DateTime<FixedOffset>,
) {
    let message = match outcome.failure() {
        Some(failure) => failure.rendered().to_owned(),
        None => FAILURE_FALLBACK_MESSAGE.to_owned(),
    };
    if let Err(error) = session.emit_log(handle, LogEntry::error(timestamp, message)) {
        warn!(item = %handle.uuid(), %error, "failed to ship failure diagnostic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Failure;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn failed() -> ExecutionOutcome {
        ExecutionOutcome::Failed {
            failure: Some(Failure::from_message("boom")),
        }
    }

    fn aborted_without_failure() -> ExecutionOutcome {
        ExecutionOutcome::Aborted { failure: None }
    }

    #[test_case(ExecutionOutcome::Passed, false, Status::Passed; "passed")]
    #[test_case(failed(), false, Status::Failed; "failure")]
    #[test_case(aborted_without_failure(), false, Status::Failed; "abort is failed")]
    #[test_case(ExecutionOutcome::Passed, true, Status::Skipped; "disabled wins over pass")]
    #[test_case(failed(), true, Status::Skipped; "disabled wins over failure")]
    fn status_mapping(outcome: ExecutionOutcome, disabled: bool, expected: Status) {
        assert_eq!(terminal_status(&outcome, disabled), expected);
    }

    #[test]
    fn rendered_text_prefers_trace() {
        let failure = Failure {
            message: "boom".to_owned(),
            trace: Some("boom\n  caused by: root".to_owned()),
        };
        assert_eq!(failure.rendered(), "boom\n  caused by: root");
        assert_eq!(Failure::from_message("boom").rendered(), "boom");
    }
}

// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced at the reporting-client boundary.

use thiserror::Error;

/// An error returned while opening a reporting session.
///
/// Fatal to reporting but never to the test run: the observer surfaces this
/// to the first caller attempting to start a node and then stays inert.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionOpenError {
    /// The server rejected the open request.
    #[error("reporting server rejected session `{name}`: {reason}")]
    Rejected {
        /// The session name that was rejected.
        name: String,
        /// The rejection reason supplied by the server.
        reason: String,
    },

    /// The request channel to the transport is closed.
    #[error("report request channel closed")]
    ChannelClosed,

    /// A transport-specific failure.
    #[error("report transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// An error returned by a session operation (start/finish/log).
///
/// These are best-effort from the observer's point of view: they are logged
/// and swallowed, never propagated to the host test runner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// The request channel to the transport is closed.
    #[error("report request channel closed")]
    ChannelClosed,

    /// The session has already been finished.
    #[error("session already finished")]
    SessionFinished,

    /// A transport-specific failure.
    #[error("report transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

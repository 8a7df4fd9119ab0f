// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Data model and client interface for relay real-time test reporting.
//!
//! This crate defines the boundary between the relay observer (see the
//! `relay-observer` crate) and a reporting service: the wire-shaped request
//! types, the eventually-resolved [`ItemHandle`], and the
//! [`ReportClient`]/[`ReportSession`] traits. Two implementations ship with
//! it: [`ChannelClient`], which queues requests for an out-of-band transport,
//! and [`RecordingClient`], an in-memory test double.
//!
//! All session operations are non-blocking: they enqueue work and return
//! immediately. Server-side confirmation happens out-of-band; see
//! [`ItemHandle`] for how the server-assigned id is resolved after the fact.

mod channel;
mod errors;
mod handle;
mod ids;
mod items;
mod log;
mod recorder;
mod session;

pub use channel::{ChannelClient, ReportRequest};
pub use errors::{ReportError, SessionOpenError};
pub use handle::ItemHandle;
pub use ids::{ItemKind, ItemUuid, SessionKind, SessionUuid};
pub use items::{ItemSpec, ItemType, OutcomeSpec, SessionMode, SessionSpec, Status};
pub use log::{LogEntry, LogLevel};
pub use recorder::{RecordingClient, RecordingSession};
pub use session::{ReportClient, ReportSession};

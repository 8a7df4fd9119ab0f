// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core lifecycle engine for relay.
//!
//! relay mirrors a hierarchical test run — suites, classes, parameterized
//! templates, individual test cases and their setup/teardown fixtures — onto
//! a remote reporting session in real time. The host test runner delivers
//! ordered lifecycle notifications per node; the [`RunObserver`] translates
//! them into start/finish/log operations against a
//! [`ReportSession`](relay_report::ReportSession), tracking one remote item
//! handle per local node and threading parent/child nesting through the
//! mapping even when notifications for different nodes interleave across
//! worker threads.
//!
//! Reporting failures never fail the test run: apart from the initial
//! session-open error (surfaced once, to the first node start), every
//! reporting-layer failure is logged and swallowed.

pub mod config;
pub mod describe;
pub mod errors;
pub mod events;
mod helpers;
pub mod identity;
mod observer;
mod outcome;
mod session;
pub mod stats;
mod tracker;

pub use observer::{RunObserver, WorkerContext};
pub use session::SessionRegistry;

// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the observer.

use relay_report::SessionOpenError;
use std::{error, fmt};
use thiserror::Error;

/// An error produced while mirroring a test run.
///
/// The only fatal condition at this boundary is a session that cannot be
/// opened; every other reporting failure is swallowed so the local run is
/// unaffected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ObserverError {
    /// The reporting session for the run could not be opened. Surfaced to the
    /// first caller attempting to start a node.
    #[error("failed to open reporting session for run `{run_id}`")]
    SessionOpen {
        /// Identity of the run root.
        run_id: String,
        /// The underlying open failure.
        #[source]
        error: SessionOpenError,
    },
}

/// Renders an error and its chain of sources, one per line.
///
/// Used both for failure diagnostics shipped to the remote session and for
/// local warnings about swallowed reporting failures.
pub struct DisplayErrorChain<E>(E);

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new display wrapper around `error`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, "\n  caused by: {error}")?;
            source = error.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Error)]
    #[error("outer failed")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, Error)]
    #[error("inner failed")]
    struct Inner;

    #[test]
    fn chain_renders_all_sources() {
        let error = Outer { inner: Inner };
        assert_eq!(
            DisplayErrorChain::new(&error).to_string(),
            "outer failed\n  caused by: inner failed"
        );
    }

    #[test]
    fn single_error_renders_alone() {
        assert_eq!(DisplayErrorChain::new(Inner).to_string(), "inner failed");
    }
}

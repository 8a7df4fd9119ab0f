// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer configuration.

use chrono::{DateTime, FixedOffset};
use relay_report::{SessionMode, SessionSpec};
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// The run name used when none is configured.
pub const DEFAULT_RUN_NAME: &str = "relay-run";

/// Configuration for a [`RunObserver`](crate::RunObserver).
///
/// Carries the session attributes (name, description, mode, tags) plus the
/// switch controlling whether skipped/disabled nodes are reported at all
/// (off by default).
#[derive(Clone, Debug)]
pub struct ObserverConfig {
    run_name: String,
    description: Option<String>,
    mode: SessionMode,
    tags: BTreeSet<SmolStr>,
    report_disabled_tests: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_NAME)
    }
}

impl ObserverConfig {
    /// Creates a configuration with the given run name and defaults for
    /// everything else.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            description: None,
            mode: SessionMode::Default,
            tags: BTreeSet::new(),
            report_disabled_tests: false,
        }
    }

    /// Reads configuration from `RELAY_*` environment variables, falling back
    /// to defaults for anything unset:
    ///
    /// * `RELAY_RUN_NAME` — the run name
    /// * `RELAY_RUN_DESCRIPTION` — the run description
    /// * `RELAY_MODE` — `default` or `debug`
    /// * `RELAY_TAGS` — comma-separated tag list
    /// * `RELAY_REPORT_DISABLED` — `1`/`true`/`yes` to report disabled tests
    pub fn from_env() -> Self {
        let mut config = match std::env::var("RELAY_RUN_NAME") {
            Ok(name) if !name.is_empty() => Self::new(name),
            _ => Self::default(),
        };
        if let Ok(description) = std::env::var("RELAY_RUN_DESCRIPTION") {
            if !description.is_empty() {
                config.description = Some(description);
            }
        }
        if let Ok(mode) = std::env::var("RELAY_MODE") {
            config.mode = parse_mode(&mode);
        }
        if let Ok(tags) = std::env::var("RELAY_TAGS") {
            config.tags = parse_tags(&tags);
        }
        if let Ok(value) = std::env::var("RELAY_REPORT_DISABLED") {
            config.report_disabled_tests = parse_bool(&value);
        }
        config
    }

    /// Sets the run description.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the session mode.
    pub fn set_mode(&mut self, mode: SessionMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Adds a tag to the run-level tag set.
    pub fn add_tag(&mut self, tag: impl Into<SmolStr>) -> &mut Self {
        self.tags.insert(tag.into());
        self
    }

    /// Controls whether skipped/disabled nodes are reported.
    pub fn set_report_disabled_tests(&mut self, report: bool) -> &mut Self {
        self.report_disabled_tests = report;
        self
    }

    /// The configured run name.
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// The configured run description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The configured session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The configured run-level tags.
    pub fn tags(&self) -> &BTreeSet<SmolStr> {
        &self.tags
    }

    /// Whether skipped/disabled nodes are reported.
    pub fn report_disabled_tests(&self) -> bool {
        self.report_disabled_tests
    }

    /// Builds the session specification for a run starting at `start_time`.
    pub(crate) fn session_spec(&self, start_time: DateTime<FixedOffset>) -> SessionSpec {
        SessionSpec {
            name: self.run_name.clone(),
            description: self.description.clone(),
            mode: self.mode,
            tags: self.tags.clone(),
            start_time,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn parse_mode(value: &str) -> SessionMode {
    if value.trim().eq_ignore_ascii_case("debug") {
        SessionMode::Debug
    } else {
        SessionMode::Default
    }
}

fn parse_tags(value: &str) -> BTreeSet<SmolStr> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(SmolStr::new)
        .collect()
}

// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path-structured node identities.
//!
//! Every node in the local test tree is identified by a hierarchical,
//! `/`-separated path of bracketed segments, e.g.
//! `[engine:junit]/[class:CalcTests]/[method:add()]`. Identities are
//! deterministic: reconstructing the same node yields the same identity.
//! Fixture interception points get synthesized identities under the node they
//! guard; template containers and their dynamic invocations are recognized by
//! segment markers.

use crate::events::FixturePhase;
use smol_str::{SmolStr, format_smolstr};
use std::fmt;

const TEMPLATE_MARKER: &str = "[test-template:";
const INVOCATION_MARKER: &str = "[test-template-invocation:";

/// A unique, hierarchical identifier for a node within a test run.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeIdentity(SmolStr);

impl NodeIdentity {
    /// Creates an identity from its string form.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// The string form of this identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity of the run root this node belongs to: the first path
    /// segment.
    pub fn root(&self) -> NodeIdentity {
        match self.0.split_once('/') {
            Some((first, _)) => Self(first.into()),
            None => self.clone(),
        }
    }

    /// The structural parent along the identity path, if this is not a root.
    pub fn parent_path(&self) -> Option<NodeIdentity> {
        self.0.rsplit_once('/').map(|(head, _)| Self(head.into()))
    }

    /// The synthesized identity of a fixture interception point under this
    /// node.
    pub fn fixture(&self, phase: FixturePhase, method_name: &str) -> NodeIdentity {
        Self(format_smolstr!(
            "{}/[fixture:{}:{}()]",
            self.0,
            phase.marker(),
            method_name
        ))
    }

    /// True if this identity names a template container: a parameterized
    /// declaration whose dynamic invocations appear as children.
    pub fn is_template_container(&self) -> bool {
        self.0.contains(TEMPLATE_MARKER) && !self.0.contains(INVOCATION_MARKER)
    }

    /// True if this identity names a dynamic invocation generated from a
    /// template.
    pub fn is_template_invocation(&self) -> bool {
        self.0.contains(INVOCATION_MARKER)
    }

    /// A display name derived from the last path segment:
    /// `.../[test-template:parse(int)]` becomes `parse(int)`.
    pub(crate) fn segment_name(&self) -> &str {
        let segment = match self.0.rsplit_once('/') {
            Some((_, last)) => last,
            None => &self.0,
        };
        let inner = segment
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(segment);
        match inner.split_once(':') {
            Some((_, name)) => name,
            None => inner,
        }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable derivation of reportable item fields.

use crate::events::NodeDescriptor;
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// The reportable fields of an item, before name truncation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemDetails {
    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Tags to attach.
    pub tags: BTreeSet<SmolStr>,
}

/// Strategy for deriving [`ItemDetails`] from a raw node notification.
///
/// Lets embedders customize naming without touching the lifecycle engine.
/// Name truncation is applied by the observer after the describer runs, so an
/// implementation cannot produce an over-long wire name.
pub trait ItemDescriber: Send + Sync {
    /// Derives the reportable fields for `node`.
    fn describe(&self, node: &NodeDescriptor) -> ItemDetails;
}

/// The default describer: display name as the name, source-level name as the
/// description, declared tags passed through.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDescriber;

impl ItemDescriber for DefaultDescriber {
    fn describe(&self, node: &NodeDescriptor) -> ItemDetails {
        ItemDetails {
            name: node.display_name.clone(),
            description: node.source_name.clone(),
            tags: node.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{events::NodeKind, identity::NodeIdentity};
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_describer_passes_fields_through() {
        let node = NodeDescriptor::new(
            NodeIdentity::new("[engine:junit]/[class:CalcTests]"),
            NodeKind::Container,
        )
        .with_display_name("CalcTests")
        .with_source_name("com.example.CalcTests")
        .with_tags(btreeset! { SmolStr::new("smoke") });

        assert_eq!(
            DefaultDescriber.describe(&node),
            ItemDetails {
                name: "CalcTests".to_owned(),
                description: Some("com.example.CalcTests".to_owned()),
                tags: btreeset! { SmolStr::new("smoke") },
            }
        );
    }
}

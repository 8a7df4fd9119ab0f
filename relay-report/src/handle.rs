// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Eventually-resolved references to remote report items.

use crate::ids::ItemUuid;
use smol_str::SmolStr;
use std::sync::{Arc, OnceLock};

/// An opaque reference to a remote report item.
///
/// Returned synchronously from [`ReportSession::start_item`][crate::ReportSession::start_item]
/// before the server has acknowledged the item. The handle carries a
/// client-side [`ItemUuid`] assigned at start time; the server-assigned id is
/// filled in later by the transport via [`resolve`][Self::resolve]. Clones
/// share the resolution slot, so a resolution performed on any clone is
/// visible through all of them.
#[derive(Clone, Debug)]
pub struct ItemHandle {
    uuid: ItemUuid,
    remote_id: Arc<OnceLock<SmolStr>>,
}

impl ItemHandle {
    /// Creates a new unresolved handle with a fresh client-side id.
    pub fn new() -> Self {
        Self::from_uuid(ItemUuid::new_v4())
    }

    /// Creates a new unresolved handle with the given client-side id.
    pub fn from_uuid(uuid: ItemUuid) -> Self {
        Self {
            uuid,
            remote_id: Arc::new(OnceLock::new()),
        }
    }

    /// The client-side id for this item.
    pub fn uuid(&self) -> ItemUuid {
        self.uuid
    }

    /// The server-assigned id, if the transport has resolved it yet.
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.get().map(SmolStr::as_str)
    }

    /// Returns true once the server-assigned id has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.remote_id.get().is_some()
    }

    /// Records the server-assigned id. The first resolution wins; later calls
    /// are ignored.
    pub fn resolve(&self, remote_id: impl Into<SmolStr>) {
        let _ = self.remote_id.set(remote_id.into());
    }
}

impl Default for ItemHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ItemHandle {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for ItemHandle {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolution_is_idempotent_and_shared() {
        let handle = ItemHandle::new();
        assert!(!handle.is_resolved());

        let clone = handle.clone();
        clone.resolve("item-1");
        // The first resolution wins and is visible through every clone.
        handle.resolve("item-2");
        assert_eq!(handle.remote_id(), Some("item-1"));
        assert_eq!(clone.remote_id(), Some("item-1"));
    }

    #[test]
    fn clones_compare_equal_by_uuid() {
        let handle = ItemHandle::new();
        assert_eq!(handle, handle.clone());
        assert_ne!(handle, ItemHandle::new());
    }
}

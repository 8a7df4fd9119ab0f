// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent mapping from node identities to remote item handles.

use crate::identity::NodeIdentity;
use relay_report::ItemHandle;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

/// A tracked, currently-open remote item.
#[derive(Clone, Debug)]
pub(crate) struct TrackedItem {
    /// The remote handle issued at start time.
    pub(crate) handle: ItemHandle,

    /// True once a child within this item's scope has finished FAILED.
    pub(crate) child_failed: bool,
}

impl TrackedItem {
    fn new(handle: ItemHandle) -> Self {
        Self {
            handle,
            child_failed: false,
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    items: HashMap<NodeIdentity, TrackedItem>,
    templates: HashSet<NodeIdentity>,
}

/// Per-observer map from node identity to remote item handle, plus the set of
/// identities that represent template containers.
///
/// Safe for concurrent use from multiple worker threads. Critical sections
/// cover only map access; the one compound operation that must be atomic —
/// the template-container presence check plus its start call — runs under the
/// map lock in [`ensure_with`](Self::ensure_with), which is harmless because
/// start calls are enqueue-only and never wait on the wire.
#[derive(Debug, Default)]
pub(crate) struct ItemTracker {
    state: Mutex<TrackerState>,
    orphan_fallbacks: AtomicU64,
}

impl ItemTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Tracks a started item under its identity.
    pub(crate) fn insert(&self, id: NodeIdentity, handle: ItemHandle) {
        let mut state = self.state.lock().unwrap();
        state.items.insert(id, TrackedItem::new(handle));
    }

    /// The handle tracked for `id`, if any.
    pub(crate) fn get(&self, id: &NodeIdentity) -> Option<ItemHandle> {
        let state = self.state.lock().unwrap();
        state.items.get(id).map(|item| item.handle.clone())
    }

    /// Stops tracking `id`, returning its entry.
    pub(crate) fn remove(&self, id: &NodeIdentity) -> Option<TrackedItem> {
        let mut state = self.state.lock().unwrap();
        state.templates.remove(id);
        state.items.remove(id)
    }

    /// Atomically ensures a template container item exists for `id`.
    ///
    /// If `id` is already tracked, returns `Ok(None)` without invoking
    /// `create`. Otherwise `create` is called — under the map lock — with the
    /// handle of `id`'s path parent (if tracked), and the resulting handle is
    /// registered both as a tracked item and as a template container.
    pub(crate) fn ensure_with<E, F>(&self, id: &NodeIdentity, create: F) -> Result<Option<ItemHandle>, E>
    where
        F: FnOnce(Option<&ItemHandle>) -> Result<ItemHandle, E>,
    {
        let mut state = self.state.lock().unwrap();
        if state.items.contains_key(id) {
            return Ok(None);
        }
        let parent = id
            .parent_path()
            .and_then(|parent_id| state.items.get(&parent_id).map(|item| item.handle.clone()));
        let handle = create(parent.as_ref())?;
        state.items.insert(id.clone(), TrackedItem::new(handle.clone()));
        state.templates.insert(id.clone());
        Ok(Some(handle))
    }

    /// Marks that a child within `id`'s scope finished FAILED.
    pub(crate) fn mark_child_failed(&self, id: &NodeIdentity) {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.items.get_mut(id) {
            item.child_failed = true;
        }
    }

    /// Removes and returns every tracked template container.
    ///
    /// Invocation-marked identities never enter the template set, but the
    /// filter is applied again here so a mis-tagged entry cannot leak into a
    /// container-level finish.
    pub(crate) fn drain_templates(&self) -> Vec<(NodeIdentity, TrackedItem)> {
        let mut state = self.state.lock().unwrap();
        let ids: Vec<_> = state
            .templates
            .iter()
            .filter(|id| id.is_template_container())
            .cloned()
            .collect();
        let mut drained = Vec::with_capacity(ids.len());
        for id in ids {
            state.templates.remove(&id);
            if let Some(item) = state.items.remove(&id) {
                drained.push((id, item));
            }
        }
        drained
    }

    /// Records a start that fell back to root level because the parent handle
    /// was missing.
    pub(crate) fn record_orphan_fallback(&self) {
        self.orphan_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of orphan-parent fallbacks so far.
    pub(crate) fn orphan_fallbacks(&self) -> u64 {
        self.orphan_fallbacks.load(Ordering::Relaxed)
    }

    /// Number of currently tracked items.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn id(s: &str) -> NodeIdentity {
        NodeIdentity::new(s)
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let tracker = ItemTracker::new();
        let handle = ItemHandle::new();
        tracker.insert(id("[root]/[class:A]"), handle.clone());

        assert_eq!(tracker.get(&id("[root]/[class:A]")), Some(handle.clone()));
        assert_eq!(tracker.get(&id("[root]/[class:B]")), None);

        let removed = tracker.remove(&id("[root]/[class:A]")).unwrap();
        assert_eq!(removed.handle, handle);
        assert!(!removed.child_failed);
        assert_eq!(tracker.remove(&id("[root]/[class:A]")).map(|i| i.handle), None);
    }

    #[test]
    fn ensure_with_creates_at_most_once() {
        let tracker = ItemTracker::new();
        let template = id("[root]/[class:A]/[test-template:parse(int)]");

        let parent_handle = ItemHandle::new();
        tracker.insert(id("[root]/[class:A]"), parent_handle.clone());

        let created = tracker
            .ensure_with::<(), _>(&template, |parent| {
                assert_eq!(parent, Some(&parent_handle));
                Ok(ItemHandle::new())
            })
            .unwrap();
        assert!(created.is_some());

        // Second ensure is a no-op; the closure must not run.
        let second = tracker
            .ensure_with::<(), _>(&template, |_| panic!("container already tracked"))
            .unwrap();
        assert_eq!(second, None);

        let drained = tracker.drain_templates();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, template);
        // Drained containers are fully retired.
        assert_eq!(tracker.get(&template), None);
        assert!(tracker.drain_templates().is_empty());
    }

    #[test]
    fn child_failed_marking() {
        let tracker = ItemTracker::new();
        tracker.insert(id("[root]/[class:A]"), ItemHandle::new());
        tracker.mark_child_failed(&id("[root]/[class:A]"));
        // Marking an untracked identity is a no-op.
        tracker.mark_child_failed(&id("[root]/[class:B]"));

        assert!(tracker.remove(&id("[root]/[class:A]")).unwrap().child_failed);
    }

    #[test]
    fn concurrent_inserts_and_removes_do_not_corrupt() {
        let tracker = Arc::new(ItemTracker::new());
        let mut handles = Vec::new();
        for worker in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let node = NodeIdentity::new(format!("[root]/[class:W{worker}]/[method:m{i}()]"));
                    tracker.insert(node.clone(), ItemHandle::new());
                    assert!(tracker.get(&node).is_some());
                    assert!(tracker.remove(&node).is_some());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.len(), 0);
        assert_eq!(tracker.orphan_fallbacks(), 0);
    }
}

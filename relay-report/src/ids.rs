// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed identifiers for sessions and items.
//!
//! Sessions and items live in different namespaces on the reporting server;
//! typed UUIDs keep the two from being confused at compile time.

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};

/// Typed-UUID kind for reporting sessions.
pub enum SessionKind {}

impl TypedUuidKind for SessionKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("relay-session");
        TAG
    }
}

/// A unique identifier for a reporting session, assigned client-side at open
/// time.
pub type SessionUuid = TypedUuid<SessionKind>;

/// Typed-UUID kind for report items.
pub enum ItemKind {}

impl TypedUuidKind for ItemKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("relay-item");
        TAG
    }
}

/// A unique identifier for a report item, assigned client-side at start time.
pub type ItemUuid = TypedUuid<ItemKind>;

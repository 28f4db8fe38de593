//! Local projection: the mirror with every pending operation replayed on top.
//!
//! # Replay rules
//!
//! - `Create` inserts only if the id is absent. A duplicate create is a no-op,
//!   never an overwrite.
//! - `Update` merges into the entry if present, otherwise does nothing (the
//!   entry may have been deleted upstream or by a later local delete).
//! - `Delete` removes the entry if present, otherwise does nothing.
//!
//! Replay never fails. The same mirror and log always yield the same
//! collection.

use crate::{Bookmark, BookmarkId, Collection, PendingOperation};
use std::collections::BTreeMap;

/// Compute the effective collection from a mirror and an ordered log.
pub fn project(mirror: &BTreeMap<BookmarkId, Bookmark>, log: &[PendingOperation]) -> Collection {
    let mut state = mirror.clone();
    for op in log {
        replay(&mut state, op);
    }
    Collection::new(state.into_values().collect())
}

/// Apply a single operation to a keyed bookmark map.
pub fn replay(state: &mut BTreeMap<BookmarkId, Bookmark>, op: &PendingOperation) {
    match op {
        PendingOperation::Create(create) => {
            state
                .entry(create.bookmark.id.clone())
                .or_insert_with(|| create.bookmark.clone());
        }
        PendingOperation::Update(update) => {
            if let Some(existing) = state.get_mut(&update.id) {
                existing.apply_patch(&update.patch, update.timestamp);
            }
        }
        PendingOperation::Delete(delete) => {
            state.remove(&delete.id);
        }
    }
}

//! # Marks Engine
//!
//! The deterministic core of an offline-first bookmark collection.
//!
//! This crate holds the data model and the pure logic that every other layer
//! builds on: bookmarks, the pending operations recorded for unconfirmed
//! mutations, the projection that replays those operations over the local
//! mirror, and duplicate detection.
//!
//! ## Design Principles
//!
//! - **No IO**: storage, network and clocks live in `marks-client`
//! - **Deterministic**: the same mirror and log always produce the same projection
//! - **Never fails on replay**: operations on absent bookmarks are skipped
//!
//! ## Core Concepts
//!
//! ### Bookmarks
//!
//! A [`Bookmark`] has a client-generated id that never changes, a mandatory
//! title and url, optional description, notes, folder and tags, visit
//! counters, and creation/update timestamps.
//!
//! ### Pending operations
//!
//! Mutations are recorded as [`PendingOperation`]s:
//! - [`CreateOp`] - full snapshot of a new bookmark
//! - [`UpdateOp`] - partial field set ([`BookmarkPatch`])
//! - [`DeleteOp`] - removal by id
//!
//! ### Projection
//!
//! [`project`] replays the log over the mirror and returns a [`Collection`]
//! ordered by `updated_at` descending, ties broken by id.
//!
//! ## Quick Start
//!
//! ```rust
//! use marks_engine::{
//!     project, Bookmark, BookmarkDraft, BookmarkPatch, CreateOp, PendingOperation, UpdateOp,
//! };
//! use std::collections::BTreeMap;
//!
//! let bookmark = Bookmark::from_draft(
//!     "bm_1",
//!     BookmarkDraft::new("Rust", "https://rust-lang.org").with_tags(["lang"]),
//!     1706745600000,
//! );
//!
//! let log = vec![
//!     PendingOperation::Create(CreateOp::new("op_1", bookmark)),
//!     PendingOperation::Update(UpdateOp::new(
//!         "op_2",
//!         "bm_1",
//!         BookmarkPatch::new().title("The Rust Language"),
//!         1706745601000,
//!     )),
//! ];
//!
//! let collection = project(&BTreeMap::new(), &log);
//! assert_eq!(collection.len(), 1);
//! assert_eq!(collection.get("bm_1").unwrap().title, "The Rust Language");
//! ```

pub mod bookmark;
pub mod collection;
pub mod duplicates;
pub mod error;
pub mod operation;
pub mod projection;

// Re-export main types at crate root
pub use bookmark::{normalize_tags, Bookmark, BookmarkDraft, BookmarkPatch};
pub use collection::{Collection, QueryBuilder};
pub use duplicates::{find_duplicates, matching_url, normalize_url, DuplicateSet};
pub use error::Error;
pub use operation::{
    decode_log, encode_log, CreateOp, DeleteOp, OperationId, PendingOperation, UpdateOp,
};
pub use projection::{project, replay};

/// Type aliases for clarity
pub type BookmarkId = String;
pub type Timestamp = u64;

//! Edge case tests for marks-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use marks_engine::{
    decode_log, encode_log, find_duplicates, normalize_url, project, Bookmark, BookmarkDraft,
    BookmarkId, BookmarkPatch, CreateOp, DeleteOp, PendingOperation, UpdateOp,
};
use std::collections::BTreeMap;

fn bookmark(id: &str, url: &str, at: u64) -> Bookmark {
    Bookmark::from_draft(id, BookmarkDraft::new(format!("Title {id}"), url), at)
}

fn mirror_of(bookmarks: Vec<Bookmark>) -> BTreeMap<BookmarkId, Bookmark> {
    bookmarks.into_iter().map(|b| (b.id.clone(), b)).collect()
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_titles_and_tags() {
    let titles = vec![
        "日本語テスト",
        "Привет мир",
        "مرحبا بالعالم",
        "🎉🚀💯",
        "Hello\nWorld\tTab",
    ];

    let log: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            PendingOperation::Create(CreateOp::new(
                format!("op_{i}"),
                Bookmark::from_draft(
                    format!("bm_{i}"),
                    BookmarkDraft::new(*title, "https://example.com").with_tags([*title]),
                    1000,
                ),
            ))
        })
        .collect();

    let collection = project(&BTreeMap::new(), &log);
    assert_eq!(collection.len(), titles.len());
    for (i, title) in titles.iter().enumerate() {
        let bm = collection.get(&format!("bm_{i}")).unwrap();
        assert_eq!(bm.title, title.trim());
        assert!(bm.has_tag(title.trim()));
    }
}

#[test]
fn unicode_url_normalization() {
    // Hosts are compared in their IDNA form.
    assert_eq!(
        normalize_url("Bücher.example/"),
        normalize_url("https://xn--bcher-kva.example")
    );
    assert_eq!(normalize_url("https://example.com/Bücher/"), "https://example.com/b%c3%bccher");
}

#[test]
fn very_long_notes_survive_log_encoding() {
    let notes = "x".repeat(1024 * 1024);
    let log = vec![
        PendingOperation::Create(CreateOp::new("op1", bookmark("a", "https://a.com", 1000))),
        PendingOperation::Update(UpdateOp::new(
            "op2",
            "a",
            BookmarkPatch::new().notes(notes.clone()),
            2000,
        )),
    ];

    let decoded = decode_log(&encode_log(&log).unwrap()).unwrap();
    let collection = project(&BTreeMap::new(), &decoded);
    assert_eq!(collection.get("a").unwrap().notes.len(), 1024 * 1024);
}

#[test]
fn empty_log_encodes_as_empty_array() {
    assert_eq!(encode_log(&[]).unwrap(), "[]");
    assert!(decode_log("[]").unwrap().is_empty());
}

// ============================================================================
// Counter Edge Cases
// ============================================================================

#[test]
fn visit_count_saturates() {
    let mut bm = bookmark("a", "https://a.com", 1000);
    bm.visit_count = u64::MAX;
    let patch = BookmarkPatch::visit(&bm, 2000);
    assert_eq!(patch.visit_count, Some(u64::MAX));
    bm.apply_patch(&patch, 2000);
    assert_eq!(bm.visit_count, u64::MAX);
}

#[test]
fn timestamps_at_zero_and_max() {
    let m = mirror_of(vec![
        bookmark("old", "https://a.com", 0),
        bookmark("new", "https://b.com", u64::MAX),
    ]);
    let ids: Vec<_> = project(&m, &[]).iter().map(|b| b.id.clone()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

// ============================================================================
// Replay Ordering Edge Cases
// ============================================================================

#[test]
fn create_delete_create_same_id() {
    let log = vec![
        PendingOperation::Create(CreateOp::new("op1", bookmark("a", "https://first.com", 1000))),
        PendingOperation::Delete(DeleteOp::new("op2", "a", 2000)),
        PendingOperation::Create(CreateOp::new("op3", bookmark("a", "https://second.com", 3000))),
    ];

    let collection = project(&BTreeMap::new(), &log);
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.get("a").unwrap().url, "https://second.com");
}

#[test]
fn rapid_updates_same_bookmark() {
    let mut log = vec![PendingOperation::Create(CreateOp::new(
        "create",
        bookmark("a", "https://a.com", 1000),
    ))];
    for i in 1..=100u64 {
        log.push(PendingOperation::Update(UpdateOp::new(
            format!("update_{i}"),
            "a",
            BookmarkPatch::new().title(format!("update_{i}")),
            1000 + i,
        )));
    }

    let collection = project(&BTreeMap::new(), &log);
    let bm = collection.get("a").unwrap();
    assert_eq!(bm.title, "update_100");
    assert_eq!(bm.updated_at, 1100);
    assert_eq!(bm.created_at, 1000);
}

#[test]
fn update_targeting_server_record() {
    let m = mirror_of(vec![bookmark("srv", "https://a.com", 1000)]);
    let log = vec![PendingOperation::Update(UpdateOp::new(
        "op1",
        "srv",
        BookmarkPatch::new().folder("reading"),
        5000,
    ))];

    let collection = project(&m, &log);
    let bm = collection.get("srv").unwrap();
    assert_eq!(bm.folder.as_deref(), Some("reading"));
    // Mirror itself is untouched.
    assert!(m["srv"].folder.is_none());
}

#[test]
fn operations_on_unknown_ids_are_ignored() {
    let m = mirror_of(vec![bookmark("a", "https://a.com", 1000)]);
    let log = vec![
        PendingOperation::Update(UpdateOp::new("op1", "x", BookmarkPatch::new().title("X"), 2000)),
        PendingOperation::Delete(DeleteOp::new("op2", "y", 2000)),
    ];
    assert_eq!(project(&m, &log), project(&m, &[]));
}

// ============================================================================
// Duplicate Edge Cases
// ============================================================================

#[test]
fn duplicates_across_mirror_and_pending() {
    let m = mirror_of(vec![bookmark("a", "https://Example.com/", 1000)]);
    let log = vec![PendingOperation::Create(CreateOp::new(
        "op1",
        bookmark("b", "example.com", 2000),
    ))];

    let collection = project(&m, &log);
    let sets = find_duplicates(&collection);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].bookmarks.len(), 2);
}

#[test]
fn three_way_duplicate_set() {
    let bookmarks = vec![
        bookmark("a", "example.com", 1000),
        bookmark("b", "HTTPS://EXAMPLE.COM/#top", 1000),
        bookmark("c", "https://example.com///", 1000),
    ];
    let sets = find_duplicates(&bookmarks);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].bookmarks.len(), 3);
}

//! Duplicate detection by normalized URL.
//!
//! Normalization parses with the `url` crate after defaulting a missing (or
//! protocol-relative) scheme to `https://`. It drops the fragment and any
//! default port, lowercases the rest, strips trailing slashes from the path
//! and keeps the query string. Detection only reports; it never merges.

use crate::Bookmark;
use serde::Serialize;
use std::collections::BTreeMap;
use url::{Position, Url};

/// Bookmarks sharing one normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSet {
    /// The normalized URL all members share
    pub key: String,
    /// Members in the order they were found
    pub bookmarks: Vec<Bookmark>,
}

/// Normalize a URL into its duplicate-detection key.
///
/// Input that does not parse as a URL even after defaulting the scheme is
/// only lowercased with its fragment removed.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        let lowered = trimmed.to_lowercase();
        return match lowered.split_once('#') {
            Some((before, _)) => before.to_string(),
            None => lowered,
        };
    };

    // Scheme, credentials, host and non-default port.
    let mut key = parsed[..Position::BeforePath].to_lowercase();
    key.push_str(&parsed.path().trim_end_matches('/').to_lowercase());
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        key.push('?');
        key.push_str(&query.to_lowercase());
    }
    key
}

/// `scheme://` prefix present. `host:port` alone does not count.
fn has_scheme(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Group bookmarks by normalized URL, keeping groups with two or more members.
///
/// Groups are ordered by key.
pub fn find_duplicates<'a, I>(bookmarks: I) -> Vec<DuplicateSet>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let mut groups: BTreeMap<String, Vec<Bookmark>> = BTreeMap::new();
    for bookmark in bookmarks {
        groups
            .entry(normalize_url(&bookmark.url))
            .or_default()
            .push(bookmark.clone());
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, bookmarks)| DuplicateSet { key, bookmarks })
        .collect()
}

/// Bookmarks whose normalized URL equals that of `url`.
pub fn matching_url<'a, I>(bookmarks: I, url: &str) -> Vec<&'a Bookmark>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let key = normalize_url(url);
    bookmarks
        .into_iter()
        .filter(|b| normalize_url(&b.url) == key)
        .collect()
}

//! The projected collection and its query builder.

use crate::Bookmark;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered, read-only set of bookmarks.
///
/// Ordering is by `updated_at` descending, ties broken by id ascending.
/// Ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    bookmarks: Vec<Bookmark>,
}

impl Collection {
    /// Build a collection from bookmarks with unique ids, sorting them.
    pub fn new(mut bookmarks: Vec<Bookmark>) -> Self {
        bookmarks.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { bookmarks }
    }

    /// Get a bookmark by ID.
    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Check if a bookmark exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks.iter()
    }

    pub fn as_slice(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Start a filtered query.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// All folder names in use, sorted.
    pub fn folders(&self) -> Vec<&str> {
        self.bookmarks
            .iter()
            .filter_map(|b| b.folder.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All tags in use, sorted.
    pub fn tags(&self) -> Vec<&str> {
        self.bookmarks
            .iter()
            .flat_map(|b| b.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Bookmark;
    type IntoIter = std::slice::Iter<'a, Bookmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.bookmarks.iter()
    }
}

/// Builder for filtering a collection.
#[derive(Debug)]
pub struct QueryBuilder<'a> {
    collection: &'a Collection,
    folder: Option<Option<String>>,
    tag: Option<String>,
    text: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    fn new(collection: &'a Collection) -> Self {
        Self {
            collection,
            folder: None,
            tag: None,
            text: None,
        }
    }

    /// Only bookmarks in this folder. An empty name selects unfiled bookmarks.
    pub fn folder(mut self, folder: &str) -> Self {
        let folder = folder.trim();
        self.folder = Some((!folder.is_empty()).then(|| folder.to_string()));
        self
    }

    /// Only bookmarks carrying this tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.trim().to_string());
        self
    }

    /// Case-insensitive substring match over title, url, description and notes.
    pub fn text(mut self, needle: &str) -> Self {
        self.text = Some(needle.to_lowercase());
        self
    }

    fn matches(&self, bookmark: &Bookmark) -> bool {
        if let Some(folder) = &self.folder {
            if bookmark.folder != *folder {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !bookmark.has_tag(tag) {
                return false;
            }
        }
        if let Some(needle) = &self.text {
            let haystacks = [
                &bookmark.title,
                &bookmark.url,
                &bookmark.description,
                &bookmark.notes,
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(needle)) {
                return false;
            }
        }
        true
    }

    /// Get all matching bookmarks in display order.
    pub fn all(self) -> Vec<&'a Bookmark> {
        self.collection.iter().filter(|b| self.matches(b)).collect()
    }

    /// Get the first matching bookmark.
    pub fn first(self) -> Option<&'a Bookmark> {
        self.collection.iter().find(|b| self.matches(b))
    }

    /// Count matching bookmarks.
    pub fn count(self) -> usize {
        self.collection.iter().filter(|b| self.matches(b)).count()
    }
}

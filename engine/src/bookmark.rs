//! Bookmark types: the stored record, the user-supplied draft, and partial patches.

use crate::{error::Result, BookmarkId, Error, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A bookmark as held in the mirror and shown in the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Client-generated identifier, immutable once assigned
    pub id: BookmarkId,
    /// Display title (non-empty after trimming)
    pub title: String,
    /// Target URL (non-empty after trimming)
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    /// Trimmed, de-duplicated, sorted tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Folder name; `None` means unfiled
    #[serde(default)]
    pub folder: Option<String>,
    /// Number of recorded visits, never decreases
    #[serde(default)]
    pub visit_count: u64,
    /// Last visit (milliseconds since epoch)
    #[serde(default)]
    pub last_visited_at: Option<Timestamp>,
    /// When the bookmark was created (milliseconds since epoch)
    pub created_at: Timestamp,
    /// When the bookmark was last changed (milliseconds since epoch)
    pub updated_at: Timestamp,
}

impl Bookmark {
    /// Build a new bookmark from a validated draft.
    pub fn from_draft(id: impl Into<BookmarkId>, draft: BookmarkDraft, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: draft.title.trim().to_string(),
            url: draft.url.trim().to_string(),
            description: draft.description,
            notes: draft.notes,
            tags: normalize_tags(draft.tags),
            folder: normalize_folder(draft.folder),
            visit_count: 0,
            last_visited_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the bookmark sits in no folder.
    pub fn is_unfiled(&self) -> bool {
        self.folder.is_none()
    }

    /// Check whether the bookmark carries the given tag (case-sensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }

    /// Merge a patch into this bookmark.
    ///
    /// `visit_count` and `last_visited_at` only move forward, and `updated_at`
    /// never goes back in time even if `timestamp` is older.
    pub fn apply_patch(&mut self, patch: &BookmarkPatch, timestamp: Timestamp) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(url) = &patch.url {
            self.url = url.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = normalize_tags(tags.iter().cloned());
        }
        if let Some(folder) = &patch.folder {
            self.folder = normalize_folder(Some(folder.clone()));
        }
        if let Some(count) = patch.visit_count {
            self.visit_count = self.visit_count.max(count);
        }
        if let Some(visited) = patch.last_visited_at {
            self.last_visited_at = Some(self.last_visited_at.map_or(visited, |v| v.max(visited)));
        }
        self.updated_at = self.updated_at.max(timestamp);
    }
}

/// User input for creating a bookmark. Identity and timestamps are assigned later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

impl BookmarkDraft {
    /// Create a draft with just a title and URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the folder.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Reject drafts whose title or URL is blank.
    pub fn validate(&self) -> Result<()> {
        require_non_blank("title", &self.title)?;
        require_non_blank("url", &self.url)
    }
}

/// A partial set of fields to merge into an existing bookmark.
///
/// `None` leaves a field untouched. An empty `folder` moves the bookmark
/// back to unfiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited_at: Option<Timestamp>,
}

impl BookmarkPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Patch recording one more visit on top of `current`.
    pub fn visit(current: &Bookmark, at: Timestamp) -> Self {
        Self {
            visit_count: Some(current.visit_count.saturating_add(1)),
            last_visited_at: Some(at),
            ..Self::default()
        }
    }

    /// Return the patch with title/url trimmed and tags normalized.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.url = self.url.map(|u| u.trim().to_string());
        self.tags = self.tags.map(normalize_tags);
        self
    }

    /// Reject patches that would blank out the title or URL.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_non_blank("title", title)?;
        }
        if let Some(url) = &self.url {
            require_non_blank("url", url)?;
        }
        Ok(())
    }

    /// Check whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Trim, drop blanks, de-duplicate (case-sensitive) and sort tags.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_folder(folder: Option<String>) -> Option<String> {
    folder
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

//! Batch import of bookmark drafts.
//!
//! Parsing of import formats happens elsewhere; this only feeds drafts
//! through [`SyncCoordinator::create`].

use crate::coordinator::SyncCoordinator;
use crate::error::{Error, Result};
use marks_engine::{normalize_url, BookmarkDraft};
use serde::Serialize;
use tracing::{debug, info};

/// Counts reported by [`SyncCoordinator::import_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl SyncCoordinator {
    /// Create every draft whose URL is not already present.
    ///
    /// Drafts with an empty URL, a URL matching an existing bookmark after
    /// normalization, or a blank title are skipped. A create the remote
    /// rejects is still counted as imported since it stays queued.
    pub async fn import_batch(&self, drafts: Vec<BookmarkDraft>) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for draft in drafts {
            if draft.url.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            let key = normalize_url(&draft.url);
            let present = self
                .collection()
                .await
                .iter()
                .any(|b| normalize_url(&b.url) == key);
            if present {
                debug!(url = %draft.url, "import skipped, url already present");
                report.skipped += 1;
                continue;
            }

            match self.create(draft).await {
                Ok(_) | Err(Error::Remote(_)) => report.imported += 1,
                Err(e) if e.is_validation() => report.skipped += 1,
                Err(e) => return Err(e),
            }
        }

        info!(
            imported = report.imported,
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }
}

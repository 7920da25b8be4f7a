use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::DocumentId;

/// Default page size for listings when the caller does not give one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size the boundary layer accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Free-form string tags attached to a document.
pub type Tags = BTreeMap<String, String>;

/// The metadata row describing one stored document.
///
/// A record exists only while both the original blob and the derived text
/// for `id` exist; the lifecycle manager is the sole writer that keeps this
/// true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// Filename of the original upload.
    pub filename: String,
    /// Content type declared by the uploader.
    pub content_type: String,
    /// Byte length of the original upload.
    pub size_bytes: u64,
    /// Tag map. Always serialized, empty when no tags were given.
    #[serde(default)]
    pub metadata: Tags,
    pub created_at: DateTime<Utc>,
    /// Set to `created_at` on insert and bumped on every successful update.
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Build a fresh record stamped with the current time.
    pub fn new(
        id: DocumentId,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
        metadata: Tags,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename: filename.into(),
            content_type: content_type.into(),
            size_bytes,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// The reduced `{id, filename}` view used by the tool-call listing.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            filename: self.filename.clone(),
        }
    }

    /// Ordering used by every listing: newest first, ties broken by id
    /// (descending) so paging over equal timestamps stays deterministic.
    pub fn recency_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Minimal listing entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
}

/// One page of a listing together with the size of the full set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentList<T = DocumentRecord> {
    pub items: Vec<T>,
    /// Number of records in the whole store, independent of the window.
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

impl DocumentList<DocumentRecord> {
    /// Project the page down to `{id, filename}` items.
    pub fn summaries(&self) -> DocumentList<DocumentSummary> {
        DocumentList {
            items: self.items.iter().map(DocumentRecord::summary).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

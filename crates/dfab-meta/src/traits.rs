//! The [`MetadataStore`] trait defining the record storage interface.
//!
//! Any backend (in-memory, SQLite) implements this trait to
//! hold one [`DocumentRecord`] per document.

use chrono::{DateTime, Utc};
use dfab_types::{DocumentId, DocumentRecord};

use crate::error::Result;

/// Fields replaced by an update. The tag map and `created_at` are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordUpdate {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl RecordUpdate {
    /// An update stamped with the current time.
    pub fn now(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size_bytes,
            updated_at: Utc::now(),
        }
    }

    /// Apply this update to `record` in place.
    pub fn apply(&self, record: &mut DocumentRecord) {
        record.filename = self.filename.clone();
        record.content_type = self.content_type.clone();
        record.size_bytes = self.size_bytes;
        record.updated_at = self.updated_at;
    }
}

/// One page of records plus the total row count, taken from one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub items: Vec<DocumentRecord>,
    pub total: u64,
}

/// Storage backend for document records.
///
/// Implementations must be thread-safe (`Send + Sync`) and make each
/// operation atomic on its own. Listings are ordered by
/// [`DocumentRecord::recency_cmp`]: newest first.
pub trait MetadataStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the id is taken.
    fn insert(&self, record: &DocumentRecord) -> Result<()>;

    /// Look up a record by id. Returns `Ok(None)` if it does not exist.
    fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>>;

    /// Update an existing record and return the new state.
    ///
    /// Returns `Ok(None)` if no record exists; an update never inserts.
    fn update(&self, id: &DocumentId, update: &RecordUpdate) -> Result<Option<DocumentRecord>>;

    /// Delete a record. Returns `Ok(true)` if a record was removed.
    fn delete(&self, id: &DocumentId) -> Result<bool>;

    /// A page of at most `limit` records starting at `offset`, with the
    /// total number of records in the store.
    fn list(&self, limit: usize, offset: usize) -> Result<RecordPage>;

    /// Whether a record exists for `id`.
    fn exists(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Total number of records.
    fn count(&self) -> Result<u64> {
        Ok(self.list(0, 0)?.total)
    }
}

/// Sort `records` by recency and cut out the requested window.
pub(crate) fn paginate(
    mut records: Vec<DocumentRecord>,
    limit: usize,
    offset: usize,
) -> RecordPage {
    let total = records.len() as u64;
    records.sort_by(DocumentRecord::recency_cmp);
    let items = records.into_iter().skip(offset).take(limit).collect();
    RecordPage { items, total }
}

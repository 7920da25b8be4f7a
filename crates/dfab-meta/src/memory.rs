//! In-memory metadata store for testing and ephemeral use.
//!
//! [`InMemoryMetadataStore`] keeps all records in a `HashMap` protected by a
//! `RwLock`. It implements the full [`MetadataStore`] trait and is suitable
//! for unit tests and short-lived processes.

use std::collections::HashMap;
use std::sync::RwLock;

use dfab_types::{DocumentId, DocumentRecord};

use crate::error::{MetaError, Result};
use crate::traits::{paginate, MetadataStore, RecordPage, RecordUpdate};

/// An in-memory implementation of [`MetadataStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<DocumentId, DocumentRecord>>,
}

impl InMemoryMetadataStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> MetaError {
    MetaError::Poisoned(e.to_string())
}

impl MetadataStore for InMemoryMetadataStore {
    fn insert(&self, record: &DocumentRecord) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(&record.id) {
            return Err(MetaError::AlreadyExists { id: record.id });
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(id).cloned())
    }

    fn update(&self, id: &DocumentId, update: &RecordUpdate) -> Result<Option<DocumentRecord>> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.get_mut(id).map(|record| {
            update.apply(record);
            record.clone()
        }))
    }

    fn delete(&self, id: &DocumentId) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.remove(id).is_some())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<RecordPage> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(paginate(records.values().cloned().collect(), limit, offset))
    }
}

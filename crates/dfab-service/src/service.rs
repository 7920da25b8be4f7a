//! The document lifecycle manager.
//!
//! Each document is three artifacts in two stores: a metadata record, the
//! original upload and the derived Markdown. There is no transaction across
//! the stores, so every operation orders its writes to keep one invariant:
//! a record exists only while both blobs exist.
//!
//! - create / update write blobs first and the record last;
//! - delete removes the record first and the blobs last;
//! - a failure after blobs were written triggers exactly one
//!   `delete_all` for the id, then the original error is returned.
//!
//! Both stores are synchronous; every call into them runs on tokio's
//! blocking pool so filesystem and database I/O never stalls a worker.
//!
//! Update deletes the previous blobs before converting the new upload. If
//! that conversion fails the record is left pointing at nothing until the
//! caller retries or deletes; reads in that window fail with a blob
//! not-found error.

use std::fmt;
use std::sync::Arc;

use dfab_blob::BlobStore;
use dfab_convert::{ConversionSource, Converter};
use dfab_meta::{MetadataStore, RecordUpdate};
use dfab_types::{ContentSlice, DocumentId, DocumentList, DocumentRecord, Outline, Tags};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};

/// Raw original bytes with the stored descriptive fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalDocument {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Orchestrates the metadata store, blob store and converter.
#[derive(Clone)]
pub struct DocumentService {
    meta: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    converter: Arc<dyn Converter>,
}

impl DocumentService {
    pub fn new(
        meta: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            meta,
            blobs,
            converter,
        }
    }

    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    // ---- Writes ----

    /// Store, convert and register a new document.
    pub async fn create(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
        tags: Option<Tags>,
    ) -> ServiceResult<DocumentRecord> {
        let id = DocumentId::new();
        self.materialize(id, filename, content_type, data).await?;

        let record = DocumentRecord::new(
            id,
            filename,
            content_type,
            data.len() as u64,
            tags.unwrap_or_default(),
        );
        let row = record.clone();
        if let Err(e) = self.with_meta(move |meta| meta.insert(&row)).await {
            self.discard_blobs(id).await;
            return Err(e);
        }

        info!(document_id = %id, filename, size_bytes = record.size_bytes, "created document");
        Ok(record)
    }

    /// Replace the original of an existing document. Tags and `created_at`
    /// are kept.
    pub async fn update(
        &self,
        id: &DocumentId,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> ServiceResult<DocumentRecord> {
        let id = *id;
        self.require(id).await?;
        self.with_blobs(move |blobs| blobs.delete_all(&id)).await?;
        self.materialize(id, filename, content_type, data).await?;

        let update = RecordUpdate::now(filename, content_type, data.len() as u64);
        match self.with_meta(move |meta| meta.update(&id, &update)).await? {
            Some(record) => {
                info!(
                    document_id = %id,
                    filename,
                    size_bytes = record.size_bytes,
                    "updated document"
                );
                Ok(record)
            }
            None => {
                // Deleted while we were converting.
                self.discard_blobs(id).await;
                Err(ServiceError::NotFound(id))
            }
        }
    }

    /// Remove a document. Blob removal is best effort once the record is gone.
    pub async fn delete(&self, id: &DocumentId) -> ServiceResult<()> {
        let id = *id;
        if !self.with_meta(move |meta| meta.delete(&id)).await? {
            return Err(ServiceError::NotFound(id));
        }
        match self.with_blobs(move |blobs| blobs.delete_all(&id)).await {
            Ok(true) => {}
            Ok(false) => debug!(document_id = %id, "no blobs to delete"),
            Err(e) => warn!(document_id = %id, error = %e, "failed to delete blobs"),
        }
        info!(document_id = %id, "deleted document");
        Ok(())
    }

    // ---- Reads ----

    pub async fn get(&self, id: &DocumentId) -> ServiceResult<DocumentRecord> {
        self.require(*id).await
    }

    /// A page of records, newest first. `limit` and `offset` are assumed to
    /// be validated by the caller.
    pub async fn list(&self, limit: usize, offset: usize) -> ServiceResult<DocumentList> {
        let page = self.with_meta(move |meta| meta.list(limit, offset)).await?;
        Ok(DocumentList {
            items: page.items,
            total: page.total,
            limit,
            offset,
        })
    }

    /// A character window of the derived text.
    pub async fn read_content(
        &self,
        id: &DocumentId,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> ServiceResult<ContentSlice> {
        let text = self.derived_text(*id).await?;
        Ok(ContentSlice::from_text(&text, offset, limit))
    }

    pub async fn read_original(&self, id: &DocumentId) -> ServiceResult<OriginalDocument> {
        let id = *id;
        let record = self.require(id).await?;
        let filename = record.filename.clone();
        let data = self
            .with_blobs(move |blobs| blobs.read_original(&id, &filename))
            .await?;
        Ok(OriginalDocument {
            data,
            content_type: record.content_type,
            filename: record.filename,
        })
    }

    /// Heading outline of the derived text.
    pub async fn outline(&self, id: &DocumentId) -> ServiceResult<Outline> {
        let text = self.derived_text(*id).await?;
        Ok(dfab_outline::outline(&text))
    }

    // ---- Internals ----

    async fn require(&self, id: DocumentId) -> ServiceResult<DocumentRecord> {
        self.with_meta(move |meta| meta.get(&id))
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    async fn derived_text(&self, id: DocumentId) -> ServiceResult<String> {
        self.require(id).await?;
        self.with_blobs(move |blobs| blobs.read_derived(&id)).await
    }

    /// Write the original, convert it and write the derived text. On any
    /// failure after the original landed, the id's blobs are removed.
    async fn materialize(
        &self,
        id: DocumentId,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> ServiceResult<()> {
        let name = filename.to_string();
        let bytes = data.to_vec();
        let handle = self
            .with_blobs(move |blobs| blobs.write_original(&id, &name, &bytes))
            .await?;

        let source = ConversionSource::new(&handle, content_type, data);
        let text = match self.converter.convert(&source).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    document_id = %id,
                    converter = self.converter.name(),
                    error = %e,
                    "conversion failed"
                );
                self.discard_blobs(id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.with_blobs(move |blobs| blobs.write_derived(&id, &text)).await {
            self.discard_blobs(id).await;
            return Err(e);
        }
        Ok(())
    }

    /// Single compensating cleanup; its own failure is only logged.
    async fn discard_blobs(&self, id: DocumentId) {
        if let Err(e) = self.with_blobs(move |blobs| blobs.delete_all(&id)).await {
            warn!(document_id = %id, error = %e, "cleanup of blobs failed");
        }
    }

    /// Run a metadata store call on the blocking pool.
    async fn with_meta<T, F>(&self, f: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn MetadataStore) -> dfab_meta::Result<T> + Send + 'static,
    {
        let meta = Arc::clone(&self.meta);
        Ok(tokio::task::spawn_blocking(move || f(meta.as_ref())).await??)
    }

    /// Run a blob store call on the blocking pool.
    async fn with_blobs<T, F>(&self, f: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn BlobStore) -> dfab_blob::BlobResult<T> + Send + 'static,
    {
        let blobs = Arc::clone(&self.blobs);
        Ok(tokio::task::spawn_blocking(move || f(blobs.as_ref())).await??)
    }
}

impl fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentService")
            .field("converter", &self.converter.name())
            .finish_non_exhaustive()
    }
}

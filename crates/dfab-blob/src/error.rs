use dfab_types::DocumentId;

use crate::traits::ArtifactKind;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No artifact of this kind exists for the document.
    #[error("{kind} blob not found for document {id}")]
    NotFound { id: DocumentId, kind: ArtifactKind },

    /// The filename cannot be stored without escaping the document's directory.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// Stored derived text is not valid UTF-8.
    #[error("derived text for document {0} is not valid UTF-8")]
    InvalidUtf8(DocumentId),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl BlobError {
    /// Returns `true` for the not-found variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

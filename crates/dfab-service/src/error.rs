use dfab_blob::BlobError;
use dfab_convert::ConversionError;
use dfab_meta::MetaError;
use dfab_types::DocumentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("metadata store error: {0}")]
    Metadata(#[from] MetaError),

    /// A blocking store call panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Returns `true` if no record exists for the requested document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

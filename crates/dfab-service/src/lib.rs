//! Document lifecycle manager for DocFabric.
//!
//! [`DocumentService`] is the only writer of documents. It composes a
//! [`MetadataStore`], a [`BlobStore`] and a [`Converter`] and keeps them
//! consistent across create, update and delete without a shared
//! transaction. The REST server, the tool endpoints and the CLI all go
//! through it.
//!
//! [`MetadataStore`]: dfab_meta::MetadataStore
//! [`BlobStore`]: dfab_blob::BlobStore
//! [`Converter`]: dfab_convert::Converter

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::{DocumentService, OriginalDocument};

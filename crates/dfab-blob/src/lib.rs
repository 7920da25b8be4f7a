//! Per-document blob storage for DocFabric.
//!
//! Each document owns two artifacts keyed by its [`DocumentId`]:
//!
//! - the **original** upload, stored under its filename, and
//! - the **derived** normalized text produced by conversion.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- plain files under `originals/{id}/` and `markdown/`
//!
//! # Design Rules
//!
//! 1. Single-artifact writes are all-or-nothing.
//! 2. One original and one derived artifact per document, at most.
//! 3. Deleting a document's blobs is idempotent.
//! 4. The store never interprets artifact contents.
//!
//! [`DocumentId`]: dfab_types::DocumentId

pub mod error;
pub mod filesystem;
pub mod memory;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use filesystem::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{validate_filename, ArtifactKind, BlobStore, OriginalHandle};

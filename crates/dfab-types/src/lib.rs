//! Foundation types for DocFabric.
//!
//! Every other DocFabric crate depends on `dfab-types`. The types here are
//! also the serialization contract shared by the REST and tool-call
//! boundaries, so their serde shape is part of the public interface.
//!
//! # Key Types
//!
//! - [`DocumentId`] -- random 128-bit (UUID v4) document identifier
//! - [`DocumentRecord`] -- the metadata row describing one document
//! - [`DocumentList`] -- a page of records plus the total count
//! - [`ContentSlice`] -- a character-addressed window into derived text
//! - [`Outline`] -- heading sections addressed in the same character units

pub mod content;
pub mod error;
pub mod identity;
pub mod outline;
pub mod record;

pub use content::ContentSlice;
pub use error::TypeError;
pub use identity::DocumentId;
pub use outline::{Outline, Section};
pub use record::{
    DocumentList, DocumentRecord, DocumentSummary, Tags, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

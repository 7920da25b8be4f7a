//! Document record storage for DocFabric.
//!
//! A [`MetadataStore`] holds exactly one [`DocumentRecord`] per document and
//! answers newest-first paginated listings.
//!
//! # Backends
//!
//! - [`InMemoryMetadataStore`] -- `HashMap` behind a `RwLock`
//! - [`SqliteMetadataStore`] -- one SQLite table, shared safely by every
//!   process that opens the same database file
//!
//! [`DocumentRecord`]: dfab_types::DocumentRecord

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{MetaError, MetaResult, Result};
pub use memory::InMemoryMetadataStore;
pub use sqlite::SqliteMetadataStore;
pub use traits::{MetadataStore, RecordPage, RecordUpdate};

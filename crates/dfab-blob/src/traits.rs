use std::path::{Path, PathBuf};

use dfab_types::DocumentId;

use crate::error::{BlobError, BlobResult};

/// The two artifact namespaces kept per document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The unmodified upload, stored under its filename.
    Original,
    /// The normalized text produced by conversion.
    Derived,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// Reference to an original blob that has just been written.
///
/// This is what the conversion gateway receives. Backends that keep blobs
/// on disk fill in `path`; purely in-memory backends leave it empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalHandle {
    pub id: DocumentId,
    pub filename: String,
    pub path: Option<PathBuf>,
}

impl OriginalHandle {
    /// On-disk location of the blob, if the backend has one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Per-document artifact storage.
///
/// All implementations must satisfy these invariants:
/// - A single write either lands completely or fails; readers never see a
///   partially written artifact.
/// - Each document has at most one original and one derived artifact.
///   Writing a new original replaces the previous one, whatever its name.
/// - `delete_all` is idempotent and removes both namespaces for the id.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Store the original upload for `id` under `filename`.
    fn write_original(
        &self,
        id: &DocumentId,
        filename: &str,
        data: &[u8],
    ) -> BlobResult<OriginalHandle>;

    /// Read the original upload stored for `id` under `filename`.
    fn read_original(&self, id: &DocumentId, filename: &str) -> BlobResult<Vec<u8>>;

    /// Store (or replace) the derived text for `id`.
    fn write_derived(&self, id: &DocumentId, text: &str) -> BlobResult<()>;

    /// Read the derived text for `id`.
    fn read_derived(&self, id: &DocumentId) -> BlobResult<String>;

    /// Remove every artifact for `id`. Returns `true` if anything was removed.
    fn delete_all(&self, id: &DocumentId) -> BlobResult<bool>;

    /// Whether an original named `filename` exists for `id`.
    fn has_original(&self, id: &DocumentId, filename: &str) -> BlobResult<bool>;

    /// Whether derived text exists for `id`.
    fn has_derived(&self, id: &DocumentId) -> BlobResult<bool>;

    /// Whether any artifact at all exists for `id`.
    fn has_any(&self, id: &DocumentId) -> BlobResult<bool>;
}

/// Reject filenames that would not stay inside the document's directory.
pub fn validate_filename(filename: &str) -> BlobResult<()> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0');
    if bad {
        return Err(BlobError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

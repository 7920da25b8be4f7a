//! Local filesystem blob store.
//!
//! Layout under the store root:
//!
//! ```text
//! originals/{id}/{filename}   the unmodified upload
//! markdown/{id}.md            the derived text
//! ```
//!
//! Every write goes to a temporary file in the destination directory and is
//! renamed into place, so a crash mid-write never leaves a torn artifact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dfab_types::DocumentId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::traits::{validate_filename, ArtifactKind, BlobStore, OriginalHandle};

const ORIGINALS_DIR: &str = "originals";
const DERIVED_DIR: &str = "markdown";
const DERIVED_EXT: &str = "md";

/// Blob store backed by plain files under a root directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the namespace directories.
    pub fn open(root: impl AsRef<Path>) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ORIGINALS_DIR))?;
        fs::create_dir_all(root.join(DERIVED_DIR))?;
        Ok(Self { root })
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the original for `id`.
    pub fn original_dir(&self, id: &DocumentId) -> PathBuf {
        self.root.join(ORIGINALS_DIR).join(id.to_string())
    }

    /// Path of the original named `filename` for `id`.
    pub fn original_path(&self, id: &DocumentId, filename: &str) -> PathBuf {
        self.original_dir(id).join(filename)
    }

    /// Path of the derived text for `id`.
    pub fn derived_path(&self, id: &DocumentId) -> PathBuf {
        self.root
            .join(DERIVED_DIR)
            .join(format!("{id}.{DERIVED_EXT}"))
    }

    /// Remove every file in `dir` except `keep`.
    fn prune_siblings(dir: &Path, keep: &str) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_name() == keep {
                continue;
            }
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Write `data` to `path` through a sibling temp file and an atomic rename.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Turn an `io::ErrorKind::NotFound` into the typed not-found error.
fn not_found_as(id: &DocumentId, kind: ArtifactKind) -> impl FnOnce(io::Error) -> BlobError + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::NotFound {
            BlobError::NotFound { id: *id, kind }
        } else {
            BlobError::Io(e)
        }
    }
}

/// Treat a missing path as nothing removed; reports whether anything was.
fn ignore_missing(result: io::Result<()>) -> io::Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl BlobStore for FsBlobStore {
    fn write_original(
        &self,
        id: &DocumentId,
        filename: &str,
        data: &[u8],
    ) -> BlobResult<OriginalHandle> {
        validate_filename(filename)?;
        let path = self.original_path(id, filename);
        write_atomic(&path, data)?;
        Self::prune_siblings(&self.original_dir(id), filename)?;
        debug!(document_id = %id, filename, bytes = data.len(), "wrote original");
        Ok(OriginalHandle {
            id: *id,
            filename: filename.to_string(),
            path: Some(path),
        })
    }

    fn read_original(&self, id: &DocumentId, filename: &str) -> BlobResult<Vec<u8>> {
        validate_filename(filename)?;
        fs::read(self.original_path(id, filename))
            .map_err(not_found_as(id, ArtifactKind::Original))
    }

    fn write_derived(&self, id: &DocumentId, text: &str) -> BlobResult<()> {
        write_atomic(&self.derived_path(id), text.as_bytes())?;
        debug!(document_id = %id, bytes = text.len(), "wrote derived text");
        Ok(())
    }

    fn read_derived(&self, id: &DocumentId) -> BlobResult<String> {
        let bytes =
            fs::read(self.derived_path(id)).map_err(not_found_as(id, ArtifactKind::Derived))?;
        String::from_utf8(bytes).map_err(|_| BlobError::InvalidUtf8(*id))
    }

    fn delete_all(&self, id: &DocumentId) -> BlobResult<bool> {
        let removed_original = ignore_missing(fs::remove_dir_all(self.original_dir(id)))?;
        let removed_derived = ignore_missing(fs::remove_file(self.derived_path(id)))?;
        if removed_original || removed_derived {
            debug!(document_id = %id, "deleted blobs");
        }
        Ok(removed_original || removed_derived)
    }

    fn has_original(&self, id: &DocumentId, filename: &str) -> BlobResult<bool> {
        validate_filename(filename)?;
        Ok(self.original_path(id, filename).try_exists()?)
    }

    fn has_derived(&self, id: &DocumentId) -> BlobResult<bool> {
        Ok(self.derived_path(id).try_exists()?)
    }

    fn has_any(&self, id: &DocumentId) -> BlobResult<bool> {
        Ok(self.original_dir(id).try_exists()? || self.has_derived(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_layout() {
        let (dir, _store) = store();
        assert!(dir.path().join("originals").is_dir());
        assert!(dir.path().join("markdown").is_dir());
    }

    #[test]
    fn original_lands_at_documented_path() {
        let (dir, store) = store();
        let id = DocumentId::new();
        let handle = store.write_original(&id, "report.pdf", b"%PDF").unwrap();
        let expected = dir
            .path()
            .join("originals")
            .join(id.to_string())
            .join("report.pdf");
        assert_eq!(handle.path(), Some(expected.as_path()));
        assert_eq!(fs::read(&expected).unwrap(), b"%PDF");
        assert_eq!(store.read_original(&id, "report.pdf").unwrap(), b"%PDF");
    }

    #[test]
    fn derived_lands_at_documented_path() {
        let (dir, store) = store();
        let id = DocumentId::new();
        store.write_derived(&id, "# Héllo").unwrap();
        let expected = dir.path().join("markdown").join(format!("{id}.md"));
        assert_eq!(fs::read_to_string(expected).unwrap(), "# Héllo");
        assert_eq!(store.read_derived(&id).unwrap(), "# Héllo");
    }

    #[test]
    fn rewriting_original_keeps_one_file() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        store.write_original(&id, "a.txt", b"a").unwrap();
        store.write_original(&id, "b.txt", b"b").unwrap();
        let names: Vec<_> = fs::read_dir(store.original_dir(&id))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["b.txt".to_string()]);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        store.write_original(&id, "a.txt", b"a").unwrap();
        store.write_derived(&id, "a").unwrap();
        let count = fs::read_dir(store.original_dir(&id)).unwrap().count();
        assert_eq!(count, 1);
        let derived = fs::read_dir(store.root().join("markdown")).unwrap().count();
        assert_eq!(derived, 1);
    }

    #[test]
    fn missing_artifacts_are_not_found() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        assert!(store.read_original(&id, "x.pdf").unwrap_err().is_not_found());
        assert!(store.read_derived(&id).unwrap_err().is_not_found());
        assert!(!store.has_original(&id, "x.pdf").unwrap());
        assert!(!store.has_derived(&id).unwrap());
        assert!(!store.has_any(&id).unwrap());
    }

    #[test]
    fn invalid_utf8_derived_is_reported() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        fs::write(store.derived_path(&id), [0xff, 0xfe, 0x00]).unwrap();
        let err = store.read_derived(&id).unwrap_err();
        assert!(matches!(err, BlobError::InvalidUtf8(_)));
    }

    #[test]
    fn traversal_filenames_are_rejected() {
        let (dir, store) = store();
        let id = DocumentId::new();
        let err = store.write_original(&id, "../escape", b"x").unwrap_err();
        assert!(matches!(err, BlobError::InvalidFilename(_)));
        assert!(!dir.path().join("originals").join("escape").exists());
    }

    #[test]
    fn delete_all_removes_everything_and_is_idempotent() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        store.write_original(&id, "a.txt", b"a").unwrap();
        store.write_derived(&id, "a").unwrap();

        assert!(store.delete_all(&id).unwrap());
        assert!(!store.original_dir(&id).exists());
        assert!(!store.derived_path(&id).exists());
        assert!(!store.has_any(&id).unwrap());

        assert!(!store.delete_all(&id).unwrap());
    }

    #[test]
    fn delete_all_with_only_original() {
        let (_dir, store) = store();
        let id = DocumentId::new();
        store.write_original(&id, "a.txt", b"a").unwrap();
        assert!(store.delete_all(&id).unwrap());
        assert!(!store.has_any(&id).unwrap());
    }

    #[test]
    fn reopen_sees_existing_blobs() {
        let (dir, store) = store();
        let id = DocumentId::new();
        store.write_derived(&id, "persisted").unwrap();
        drop(store);
        let reopened = FsBlobStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read_derived(&id).unwrap(), "persisted");
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use dfab_types::DocumentId;

use crate::error::{BlobError, BlobResult};
use crate::traits::{validate_filename, ArtifactKind, BlobStore, OriginalHandle};

/// An original upload held in memory.
#[derive(Clone, Debug)]
struct StoredOriginal {
    filename: String,
    data: Vec<u8>,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Both namespaces live behind their own
/// `RwLock`; artifacts are cloned on read and write. Handles returned by
/// [`BlobStore::write_original`] carry no path.
pub struct InMemoryBlobStore {
    originals: RwLock<HashMap<DocumentId, StoredOriginal>>,
    derived: RwLock<HashMap<DocumentId, String>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            originals: RwLock::new(HashMap::new()),
            derived: RwLock::new(HashMap::new()),
        }
    }

    /// Number of originals currently stored.
    pub fn original_count(&self) -> usize {
        self.originals.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Number of derived artifacts currently stored.
    pub fn derived_count(&self) -> usize {
        self.derived.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if neither namespace holds anything.
    pub fn is_empty(&self) -> bool {
        self.original_count() == 0 && self.derived_count() == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn write_original(
        &self,
        id: &DocumentId,
        filename: &str,
        data: &[u8],
    ) -> BlobResult<OriginalHandle> {
        validate_filename(filename)?;
        let mut map = self.originals.write().map_err(|_| BlobError::Poisoned)?;
        map.insert(
            *id,
            StoredOriginal {
                filename: filename.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(OriginalHandle {
            id: *id,
            filename: filename.to_string(),
            path: None,
        })
    }

    fn read_original(&self, id: &DocumentId, filename: &str) -> BlobResult<Vec<u8>> {
        let map = self.originals.read().map_err(|_| BlobError::Poisoned)?;
        map.get(id)
            .filter(|o| o.filename == filename)
            .map(|o| o.data.clone())
            .ok_or(BlobError::NotFound {
                id: *id,
                kind: ArtifactKind::Original,
            })
    }

    fn write_derived(&self, id: &DocumentId, text: &str) -> BlobResult<()> {
        let mut map = self.derived.write().map_err(|_| BlobError::Poisoned)?;
        map.insert(*id, text.to_string());
        Ok(())
    }

    fn read_derived(&self, id: &DocumentId) -> BlobResult<String> {
        let map = self.derived.read().map_err(|_| BlobError::Poisoned)?;
        map.get(id).cloned().ok_or(BlobError::NotFound {
            id: *id,
            kind: ArtifactKind::Derived,
        })
    }

    fn delete_all(&self, id: &DocumentId) -> BlobResult<bool> {
        let removed_original = self
            .originals
            .write()
            .map_err(|_| BlobError::Poisoned)?
            .remove(id)
            .is_some();
        let removed_derived = self
            .derived
            .write()
            .map_err(|_| BlobError::Poisoned)?
            .remove(id)
            .is_some();
        Ok(removed_original || removed_derived)
    }

    fn has_original(&self, id: &DocumentId, filename: &str) -> BlobResult<bool> {
        let map = self.originals.read().map_err(|_| BlobError::Poisoned)?;
        Ok(map.get(id).is_some_and(|o| o.filename == filename))
    }

    fn has_derived(&self, id: &DocumentId) -> BlobResult<bool> {
        let map = self.derived.read().map_err(|_| BlobError::Poisoned)?;
        Ok(map.contains_key(id))
    }

    fn has_any(&self, id: &DocumentId) -> BlobResult<bool> {
        let has_original = self
            .originals
            .read()
            .map_err(|_| BlobError::Poisoned)?
            .contains_key(id);
        Ok(has_original || self.has_derived(id)?)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("originals", &self.original_count())
            .field("derived", &self.derived_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Originals
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_original() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        let handle = store.write_original(&id, "a.pdf", b"pdf bytes").unwrap();
        assert_eq!(handle.id, id);
        assert_eq!(handle.filename, "a.pdf");
        assert!(handle.path().is_none());
        assert_eq!(store.read_original(&id, "a.pdf").unwrap(), b"pdf bytes");
    }

    #[test]
    fn read_original_with_wrong_name_is_not_found() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        store.write_original(&id, "a.pdf", b"x").unwrap();
        let err = store.read_original(&id, "b.pdf").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn new_original_replaces_previous() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        store.write_original(&id, "a.pdf", b"old").unwrap();
        store.write_original(&id, "b.docx", b"new").unwrap();
        assert!(!store.has_original(&id, "a.pdf").unwrap());
        assert_eq!(store.read_original(&id, "b.docx").unwrap(), b"new");
        assert_eq!(store.original_count(), 1);
    }

    #[test]
    fn rejects_path_like_filename() {
        let store = InMemoryBlobStore::new();
        let err = store
            .write_original(&DocumentId::new(), "../x", b"x")
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidFilename(_)));
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Derived
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_derived() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        store.write_derived(&id, "# Title").unwrap();
        assert_eq!(store.read_derived(&id).unwrap(), "# Title");
        store.write_derived(&id, "# Other").unwrap();
        assert_eq!(store.read_derived(&id).unwrap(), "# Other");
    }

    #[test]
    fn missing_derived_is_not_found() {
        let store = InMemoryBlobStore::new();
        let err = store.read_derived(&DocumentId::new()).unwrap_err();
        assert!(matches!(
            err,
            BlobError::NotFound {
                kind: ArtifactKind::Derived,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_all_removes_both_namespaces() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        store.write_original(&id, "a.txt", b"a").unwrap();
        store.write_derived(&id, "a").unwrap();
        assert!(store.has_any(&id).unwrap());

        assert!(store.delete_all(&id).unwrap());
        assert!(!store.has_any(&id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_all_is_idempotent() {
        let store = InMemoryBlobStore::new();
        let id = DocumentId::new();
        assert!(!store.delete_all(&id).unwrap());
        store.write_derived(&id, "x").unwrap();
        assert!(store.delete_all(&id).unwrap());
        assert!(!store.delete_all(&id).unwrap());
    }

    #[test]
    fn delete_leaves_other_documents() {
        let store = InMemoryBlobStore::new();
        let keep = DocumentId::new();
        let drop = DocumentId::new();
        store.write_derived(&keep, "keep").unwrap();
        store.write_derived(&drop, "drop").unwrap();
        store.delete_all(&drop).unwrap();
        assert!(store.has_derived(&keep).unwrap());
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlobStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("originals"));
    }
}

//! SQLite-backed metadata store.
//!
//! Records live in one `documents` table keyed by the document id. The
//! primary key turns a duplicate insert into a constraint violation, and
//! SQLite's own locking serializes writers across every connection to the
//! same database file, including other processes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dfab_types::{DocumentId, DocumentRecord, Tags};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{MetaError, Result};
use crate::traits::{MetadataStore, RecordPage, RecordUpdate};

/// How long a connection waits on another writer before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id           TEXT PRIMARY KEY,
        filename     TEXT NOT NULL,
        content_type TEXT NOT NULL,
        size_bytes   INTEGER NOT NULL,
        metadata     TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_documents_recency
        ON documents(created_at DESC, id DESC);";

const COLUMNS: &str = "id, filename, content_type, size_bytes, metadata, created_at, updated_at";

/// A [`MetadataStore`] over a SQLite database file.
pub struct SqliteMetadataStore {
    conn: Mutex<Connection>,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), journal_mode = %mode, "opened metadata database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MetaError::Poisoned(e.to_string()))
    }
}

impl std::fmt::Debug for SqliteMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMetadataStore").finish_non_exhaustive()
    }
}

impl MetadataStore for SqliteMetadataStore {
    fn insert(&self, record: &DocumentRecord) -> Result<()> {
        let size = encode_size(record.size_bytes)?;
        let tags = serde_json::to_string(&record.metadata)
            .map_err(|e| MetaError::Serialization(e.to_string()))?;
        let conn = self.conn()?;
        let inserted = conn.execute(
            &format!("INSERT INTO documents ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                record.id.to_string(),
                record.filename,
                record.content_type,
                size,
                tags,
                encode_time(&record.created_at),
                encode_time(&record.updated_at),
            ],
        );
        match inserted {
            Ok(_) => {
                debug!(document_id = %record.id, "inserted record");
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => {
                Err(MetaError::AlreadyExists { id: record.id })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
                params![id.to_string()],
                RawRecord::read,
            )
            .optional()?;
        raw.map(RawRecord::decode).transpose()
    }

    fn update(&self, id: &DocumentId, update: &RecordUpdate) -> Result<Option<DocumentRecord>> {
        let size = encode_size(update.size_bytes)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE documents
             SET filename = ?1, content_type = ?2, size_bytes = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                update.filename,
                update.content_type,
                size,
                encode_time(&update.updated_at),
                id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let raw = tx.query_row(
            &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
            params![id.to_string()],
            RawRecord::read,
        )?;
        tx.commit()?;
        debug!(document_id = %id, "updated record");
        raw.decode().map(Some)
    }

    fn delete(&self, id: &DocumentId) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])?;
        if removed > 0 {
            debug!(document_id = %id, "deleted record");
        }
        Ok(removed > 0)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<RecordPage> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let total: i64 = tx.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let items = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {COLUMNS} FROM documents
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![clamp(limit), clamp(offset)], RawRecord::read)?;
            let items = rows
                .map(|row| row.map_err(MetaError::from).and_then(RawRecord::decode))
                .collect::<Result<Vec<_>>>()?;
            items
        };
        tx.commit()?;
        Ok(RecordPage {
            items,
            total: total.max(0) as u64,
        })
    }

    fn exists(&self, id: &DocumentId) -> Result<bool> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM documents WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

// ---------------------------------------------------------------------------
// Row encoding
// ---------------------------------------------------------------------------

/// Column values as stored, before validation.
struct RawRecord {
    id: String,
    filename: String,
    content_type: String,
    size_bytes: i64,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl RawRecord {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            content_type: row.get(2)?,
            size_bytes: row.get(3)?,
            metadata: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<DocumentRecord> {
        let corrupt = |reason: String| MetaError::CorruptRecord {
            id: self.id.clone(),
            reason,
        };
        let id = DocumentId::parse(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let size_bytes = u64::try_from(self.size_bytes)
            .map_err(|_| corrupt(format!("negative size {}", self.size_bytes)))?;
        let metadata: Tags =
            serde_json::from_str(&self.metadata).map_err(|e| corrupt(e.to_string()))?;
        let created_at = decode_time(&self.created_at).map_err(&corrupt)?;
        let updated_at = decode_time(&self.updated_at).map_err(&corrupt)?;
        Ok(DocumentRecord {
            id,
            filename: self.filename,
            content_type: self.content_type,
            size_bytes,
            metadata,
            created_at,
            updated_at,
        })
    }
}

/// Fixed-width RFC 3339 so that text order is time order.
fn encode_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {s:?}: {e}"))
}

fn encode_size(size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|_| MetaError::Serialization(format!("size {size} out of range")))
}

fn clamp(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

//! Persistent store for workshop state.
//!
//! The whole [`WorkshopState`] is kept as one JSON blob under one key.
//! Loading never fails: a missing blob yields an empty state and a corrupt
//! blob is logged and replaced by an empty state. Saving either writes the
//! whole blob or nothing.

pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::model::WorkshopState;

/// Key the state blob is stored under unless configured otherwise.
pub const DEFAULT_STORE_KEY: &str = "bindsWorkshopData";

/// Where workshop state is persisted.
pub trait Store {
    /// Read the stored state, falling back to an empty state.
    fn load(&self) -> WorkshopState;

    /// Replace the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the write is rejected. Nothing is
    /// written in that case.
    fn save(&mut self, state: &WorkshopState) -> Result<()>;
}

/// Decode a stored blob, logging and discarding it if it is corrupt.
fn decode_blob(blob: Option<&str>) -> WorkshopState {
    let Some(blob) = blob else {
        debug!("No stored workshop data, starting empty");
        return WorkshopState::new();
    };

    match serde_json::from_str::<WorkshopState>(blob) {
        Ok(state) => {
            debug!(participants = state.len(), "Loaded workshop data");
            state
        }
        Err(e) => {
            warn!(error = %e, "Stored workshop data is corrupt, starting empty");
            WorkshopState::new()
        }
    }
}

/// `SQLite`-backed store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Key the state blob lives under.
    key: String,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, key: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;
        schema::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            key: key.into(),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            key: DEFAULT_STORE_KEY.to_string(),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The key the state blob is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the raw blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Write a raw blob under `key` in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous value is kept.
    pub fn put_raw(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT length(value), updated_at FROM kv WHERE key = ?1",
                [&self.key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (blob_bytes, last_saved) = match row {
            Some((len, updated_at)) => (
                u64::try_from(len).unwrap_or(0),
                DateTime::parse_from_rfc3339(&updated_at)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            ),
            None => (0, None),
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            blob_bytes,
            last_saved,
            db_size_bytes,
        })
    }
}

impl Store for SqliteStore {
    fn load(&self) -> WorkshopState {
        match self.get_raw(&self.key) {
            Ok(blob) => decode_blob(blob.as_deref()),
            Err(e) => {
                warn!(error = %e, "Failed to read workshop data, starting empty");
                WorkshopState::new()
            }
        }
    }

    fn save(&mut self, state: &WorkshopState) -> Result<()> {
        let blob = serde_json::to_string(state)?;
        let key = self.key.clone();
        self.put_raw(&key, &blob).map_err(|e| {
            error!(error = %e, "Failed to save workshop data");
            Error::storage(e.to_string())
        })?;
        debug!(bytes = blob.len(), "Saved workshop data");
        Ok(())
    }
}

/// Statistics about the stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Size of the stored JSON blob in bytes.
    pub blob_bytes: u64,
    /// When the blob was last written.
    pub last_saved: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Store that keeps the blob in memory.
///
/// Writes can be made to fail, which stands in for a full disk or an
/// exhausted quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
    fail_writes: bool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `blob`.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            fail_writes: false,
        }
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// The blob as last saved.
    #[must_use]
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> WorkshopState {
        decode_blob(self.blob.as_deref())
    }

    fn save(&mut self, state: &WorkshopState) -> Result<()> {
        if self.fail_writes {
            error!("Failed to save workshop data: write rejected");
            return Err(Error::storage("write rejected"));
        }
        self.blob = Some(serde_json::to_string(state)?);
        Ok(())
    }
}

//! Persistent thumbnail cache.
//!
//! The store maps a [`ContentKey`] to a thumbnail payload (a data URI). It is
//! opened once at startup, shared as `Arc<dyn ThumbnailStore>` by every
//! concurrent request, and closed at shutdown.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::settings::{StorageBackend, StorageConfig};
use crate::error::{CoreError, CoreResult};
use crate::thumb::key::ContentKey;

/// Key-value store of thumbnail payloads.
///
/// Every operation is atomic for its own key; there are no cross-key
/// transactions. Concurrent writes to the same key resolve as last write wins.
pub trait ThumbnailStore: Send + Sync {
    fn get(&self, key: &ContentKey) -> CoreResult<Option<String>>;

    /// Inserts or replaces the payload for `key`.
    fn put(&self, key: &ContentKey, payload: &str) -> CoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &ContentKey) -> CoreResult<()>;

    /// Removes every record and returns how many were removed.
    fn clear(&self) -> CoreResult<usize>;

    /// Releases the backend. Later calls fail with [`CoreError::StoreUnavailable`].
    fn close(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// Looks up a thumbnail, treating any store failure as a cache miss.
pub fn cached_thumbnail(store: &dyn ThumbnailStore, key: &ContentKey) -> Option<String> {
    match store.get(key) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(%key, "thumbnail lookup failed, treating as miss: {e}");
            None
        }
    }
}

/// Opens the store selected by `config`.
pub fn open_store(config: &StorageConfig) -> CoreResult<Arc<dyn ThumbnailStore>> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteThumbnailStore::open_pooled(&config.thumbs, config.connections)?;
            tracing::info!(path = %config.thumbs.display(), "opened thumbnail store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::info!("using in-memory thumbnail store");
            Ok(Arc::new(MemoryThumbnailStore::new()))
        }
    }
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS thumbnails (
    key     BLOB PRIMARY KEY,
    payload TEXT NOT NULL
)";

/// [`ThumbnailStore`] persisted in an embedded SQLite database.
///
/// The database runs in WAL mode. Each operation borrows its own connection,
/// so readers proceed while another request writes. Up to `max_idle`
/// connections are kept for reuse.
pub struct SqliteThumbnailStore {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
    closed: AtomicBool,
}

impl SqliteThumbnailStore {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_pooled(path, 4)
    }

    /// Like [`SqliteThumbnailStore::open`], keeping at most `max_idle` idle
    /// connections (at least one).
    pub fn open_pooled(path: &Path, max_idle: usize) -> CoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::from_io(parent, e))?;
        }
        let conn = connect(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            path: path.to_path_buf(),
            idle: Mutex::new(vec![conn]),
            max_idle: max_idle.max(1),
            closed: AtomicBool::new(false),
        })
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> CoreResult<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::StoreUnavailable("store is closed".to_string()));
        }
        let reused = self.lock_idle()?.pop();
        let conn = match reused {
            Some(conn) => conn,
            None => connect(&self.path)?,
        };

        // the pool lock is not held while the statement runs
        let result = op(&conn);

        let mut idle = self.lock_idle()?;
        if !self.closed.load(Ordering::Acquire) && idle.len() < self.max_idle {
            idle.push(conn);
        }
        Ok(result?)
    }

    fn lock_idle(&self) -> CoreResult<MutexGuard<'_, Vec<Connection>>> {
        self.idle
            .lock()
            .map_err(|_| CoreError::StoreUnavailable("store lock poisoned".to_string()))
    }
}

fn connect(path: &Path) -> CoreResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        tracing::warn!(path = %path.display(), %mode, "thumbnail store is not in WAL mode");
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

impl ThumbnailStore for SqliteThumbnailStore {
    fn get(&self, key: &ContentKey) -> CoreResult<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT payload FROM thumbnails WHERE key = ?1",
                params![key.as_bytes().to_vec()],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn put(&self, key: &ContentKey, payload: &str) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO thumbnails (key, payload) VALUES (?1, ?2)",
                params![key.as_bytes().to_vec(), payload],
            )
        })?;
        Ok(())
    }

    fn delete(&self, key: &ContentKey) -> CoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM thumbnails WHERE key = ?1",
                params![key.as_bytes().to_vec()],
            )
        })?;
        Ok(())
    }

    fn clear(&self) -> CoreResult<usize> {
        self.with_conn(|conn| conn.execute("DELETE FROM thumbnails", []))
    }

    fn close(&self) -> CoreResult<()> {
        let drained: Vec<Connection> = {
            let mut idle = self.lock_idle()?;
            self.closed.store(true, Ordering::Release);
            idle.drain(..).collect()
        };
        for conn in drained {
            conn.close().map_err(|(_, e)| CoreError::from(e))?;
        }
        Ok(())
    }
}

/// [`ThumbnailStore`] kept in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryThumbnailStore {
    entries: DashMap<ContentKey, String>,
    closed: AtomicBool,
}

impl MemoryThumbnailStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CoreError::StoreUnavailable("store is closed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ThumbnailStore for MemoryThumbnailStore {
    fn get(&self, key: &ContentKey) -> CoreResult<Option<String>> {
        self.ensure_open()?;
        Ok(self.entries.get(key).map(|payload| payload.value().clone()))
    }

    fn put(&self, key: &ContentKey, payload: &str) -> CoreResult<()> {
        self.ensure_open()?;
        self.entries.insert(*key, payload.to_string());
        Ok(())
    }

    fn delete(&self, key: &ContentKey) -> CoreResult<()> {
        self.ensure_open()?;
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> CoreResult<usize> {
        self.ensure_open()?;
        let keys: Vec<ContentKey> = self.entries.iter().map(|entry| *entry.key()).collect();
        Ok(keys
            .iter()
            .filter(|key| self.entries.remove(*key).is_some())
            .count())
    }

    fn close(&self) -> CoreResult<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        Ok(())
    }
}

//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use url::Url;

use super::traits::AssetResponse;

/// A stored response.
#[derive(Debug, Clone)]
pub struct CachedAsset {
  pub response: AssetResponse,
  /// When the response was stored
  pub cached_at: DateTime<Utc>,
}

/// Persisted worker lifecycle slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSlot {
  /// Version currently in control
  Active,
  /// Installed version waiting to take over
  Waiting,
}

impl LifecycleSlot {
  fn as_str(self) -> &'static str {
    match self {
      LifecycleSlot::Active => "active",
      LifecycleSlot::Waiting => "waiting",
    }
  }
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Names of all caches, oldest first.
  fn cache_names(&self) -> Result<Vec<String>>;

  fn has_cache(&self, cache: &str) -> Result<bool>;

  /// Delete a cache and all of its entries. Returns whether it existed.
  fn delete_cache(&self, cache: &str) -> Result<bool>;

  /// Store one response, creating the cache if needed.
  fn put(&self, cache: &str, key: &str, response: &AssetResponse) -> Result<()>;

  /// Store a batch of responses atomically, creating the cache if needed.
  fn put_all(&self, cache: &str, entries: &[(String, AssetResponse)]) -> Result<()>;

  /// Look up a stored response.
  fn match_key(&self, cache: &str, key: &str) -> Result<Option<CachedAsset>>;

  fn entry_count(&self, cache: &str) -> Result<usize>;

  fn lifecycle(&self, slot: LifecycleSlot) -> Result<Option<String>>;

  fn set_lifecycle(&self, slot: LifecycleSlot, value: Option<&str>) -> Result<()>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the store at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a throwaway in-memory store.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("coherent").join("assets.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per named cache version
CREATE TABLE IF NOT EXISTS caches (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stored responses
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_name TEXT NOT NULL,
    request_key TEXT NOT NULL,
    response_url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    body_sha256 TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (cache_name, request_key)
);

-- Active / waiting versions
CREATE TABLE IF NOT EXISTS worker_state (
    slot TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

fn body_digest(body: &[u8]) -> String {
  hex::encode(Sha256::digest(body))
}

fn insert_entry(conn: &Connection, cache: &str, key: &str, response: &AssetResponse) -> Result<()> {
  conn
    .execute(
      "INSERT OR IGNORE INTO caches (name) VALUES (?)",
      params![cache],
    )
    .map_err(|e| eyre!("Failed to create cache {}: {}", cache, e))?;

  conn
    .execute(
      "INSERT OR REPLACE INTO cache_entries
         (cache_name, request_key, response_url, status, content_type, body, body_sha256, cached_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))",
      params![
        cache,
        key,
        response.url.as_str(),
        response.status,
        response.content_type,
        response.body,
        body_digest(&response.body),
      ],
    )
    .map_err(|e| eyre!("Failed to store {}: {}", key, e))?;

  Ok(())
}

impl CacheStorage for SqliteStorage {
  fn cache_names(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare("SELECT name FROM caches ORDER BY created_at, rowid")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list caches: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read cache name: {}", e))?;

    Ok(names)
  }

  fn has_cache(&self, cache: &str) -> Result<bool> {
    let conn = self.lock()?;
    let found = conn
      .query_row(
        "SELECT 1 FROM caches WHERE name = ?",
        params![cache],
        |_| Ok(()),
      )
      .optional()
      .map_err(|e| eyre!("Failed to look up cache {}: {}", cache, e))?;
    Ok(found.is_some())
  }

  fn delete_cache(&self, cache: &str) -> Result<bool> {
    let conn = self.lock()?;
    let tx = conn
      .unchecked_transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "DELETE FROM cache_entries WHERE cache_name = ?",
      params![cache],
    )
    .map_err(|e| eyre!("Failed to delete entries of {}: {}", cache, e))?;

    let deleted = tx
      .execute("DELETE FROM caches WHERE name = ?", params![cache])
      .map_err(|e| eyre!("Failed to delete cache {}: {}", cache, e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(deleted > 0)
  }

  fn put(&self, cache: &str, key: &str, response: &AssetResponse) -> Result<()> {
    let conn = self.lock()?;
    insert_entry(&conn, cache, key, response)
  }

  fn put_all(&self, cache: &str, entries: &[(String, AssetResponse)]) -> Result<()> {
    let conn = self.lock()?;
    let tx = conn
      .unchecked_transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "INSERT OR IGNORE INTO caches (name) VALUES (?)",
      params![cache],
    )
    .map_err(|e| eyre!("Failed to create cache {}: {}", cache, e))?;

    for (key, response) in entries {
      insert_entry(&tx, cache, key, response)?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn match_key(&self, cache: &str, key: &str) -> Result<Option<CachedAsset>> {
    let conn = self.lock()?;

    type Row = (String, u16, Option<String>, Vec<u8>, String, String);
    let row: Option<Row> = conn
      .query_row(
        "SELECT response_url, status, content_type, body, body_sha256, cached_at
         FROM cache_entries WHERE cache_name = ? AND request_key = ?",
        params![cache, key],
        |row| {
          Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
          ))
        },
      )
      .optional()
      .map_err(|e| eyre!("Failed to look up {}: {}", key, e))?;

    let Some((url, status, content_type, body, digest, cached_at)) = row else {
      return Ok(None);
    };

    if body_digest(&body) != digest {
      warn!(%cache, %key, "Cached body does not match its digest, ignoring entry");
      return Ok(None);
    }

    let url = Url::parse(&url).map_err(|e| eyre!("Invalid stored URL '{}': {}", url, e))?;

    Ok(Some(CachedAsset {
      response: AssetResponse {
        url,
        status,
        content_type,
        body,
      },
      cached_at: parse_datetime(&cached_at)?,
    }))
  }

  fn entry_count(&self, cache: &str) -> Result<usize> {
    let conn = self.lock()?;
    let count: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?",
        params![cache],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to count entries of {}: {}", cache, e))?;
    Ok(count as usize)
  }

  fn lifecycle(&self, slot: LifecycleSlot) -> Result<Option<String>> {
    let conn = self.lock()?;
    conn
      .query_row(
        "SELECT value FROM worker_state WHERE slot = ?",
        params![slot.as_str()],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read {} version: {}", slot.as_str(), e))
  }

  fn set_lifecycle(&self, slot: LifecycleSlot, value: Option<&str>) -> Result<()> {
    let conn = self.lock()?;
    let result = match value {
      Some(v) => conn.execute(
        "INSERT OR REPLACE INTO worker_state (slot, value) VALUES (?, ?)",
        params![slot.as_str(), v],
      ),
      None => conn.execute(
        "DELETE FROM worker_state WHERE slot = ?",
        params![slot.as_str()],
      ),
    };
    result.map_err(|e| eyre!("Failed to write {} version: {}", slot.as_str(), e))?;
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

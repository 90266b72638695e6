// src/store.rs
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const WORKOUTS_KEY: &str = "fitlife_workouts";
pub const MEALS_KEY: &str = "fitlife_meals";
pub const NOTES_KEY: &str = "fitlife_notes";
pub const SETTINGS_KEY: &str = "fitlife_settings";
pub const PROFILE_IMAGE_KEY: &str = "fitlife_profile_image";
pub const SETTINGS_LAST_UPDATE_KEY: &str = "fitlife_settings_last_update";
/// Owned by the workout planner; only ever read here.
pub const WORKOUT_TODOS_KEY: &str = "workout_todos";

const STORE_FILE_NAME: &str = "fitlife.sqlite";
const APP_DATA_DIR: &str = "fitlife";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend failed: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("Storage quota exceeded while writing '{key}' ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("Failed to serialize value for storage: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage is disabled")]
    Disabled,
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing store file: {0}")]
    Io(#[from] std::io::Error),
}

/// A flat string-to-string store shared by every page of the application.
pub trait KeyValueStore {
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// # Errors
    /// Returns `StoreError` if the value cannot be written (quota, disabled, backend failure).
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// # Errors
    /// Returns `StoreError` if the backend rejects the removal.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    /// Removes every key, including ones this application does not own.
    /// # Errors
    /// Returns `StoreError` if the backend rejects the removal.
    fn clear(&mut self) -> Result<(), StoreError>;
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Gets the path to the SQLite store file within the app's data directory.
/// Creates the directory if it doesn't exist.
/// # Errors
/// Returns `StoreError::DataDir` or `StoreError::Io`.
pub fn default_store_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir().ok_or(StoreError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(STORE_FILE_NAME))
}

/// Durable store kept in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file at `path`.
    /// # Errors
    /// Returns `StoreError` if the file cannot be opened or the schema created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// # Errors
    /// Returns `StoreError` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(StoreError::Backend)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

/// Volatile store. An optional quota (in bytes of keys plus values) makes writes
/// fail the way a full browser store does.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
            + key.len()
            + value.len()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_with(key, value);
            if needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

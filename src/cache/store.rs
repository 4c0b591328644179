//! File-backed snapshot store for cache entries
//!
//! The whole cache lives in a single JSON object mapping cache key to
//! `{ "timestamp": <epoch millis>, "value": <any JSON> }`. Every read loads the
//! full snapshot and every write replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Full contents of the cache file, ordered by key
pub type Snapshot = BTreeMap<String, CacheEntry>;

/// Errors raised by file-backed stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file or its directory could not be read, created or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold the expected JSON structure
    #[error("Corrupt data in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded as JSON
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A single cached value with the time it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the value was written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// The cached payload, opaque to the store
    pub value: Value,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time
    pub fn new(value: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            value,
        }
    }
}

/// Durable key/entry mapping backed by one JSON file
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Creates a store backed by the file at `path`
    ///
    /// Nothing is touched on disk until the first `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backing file as an empty object if it does not exist yet
    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&Snapshot::new())
    }

    /// Reads the full snapshot
    ///
    /// An absent file is created empty and an empty snapshot is returned.
    /// A file that exists but cannot be parsed is reported as `Corrupt`.
    pub fn load(&self) -> Result<Snapshot, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let empty = Snapshot::new();
                self.save(&empty)?;
                return Ok(empty);
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the full snapshot on disk
    ///
    /// Data is written to a sibling temp file and renamed over the target, so
    /// readers see either the previous snapshot or the new one.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        write_json_atomic(&self.path, &serde_json::to_string(snapshot)?)
    }
}

/// Writes `json` to `path` via a temp file and rename, creating parent directories
pub(crate) fn write_json_atomic(path: &Path, json: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, json).map_err(|e| StorageError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))
}

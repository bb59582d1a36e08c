//! Where callers keep aliases and wrapped keys.
//!
//! The keystore never decides persistence; it talks to a [`PropertyStore`]
//! and expects values back exactly as it stored them. Two stores ship
//! here: an in-memory map for tests and short-lived processes, and a
//! single JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::write_private_atomic;
use crate::error::KeyStoreError;

/// String key/value persistence.
pub trait PropertyStore: Send + Sync {
    /// Value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Store`] or [`KeyStoreError::Io`] if the
    /// backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Store`] or [`KeyStoreError::Io`] if the
    /// backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyStoreError>;
}

// ── In memory ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryPropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, KeyStoreError> {
        self.entries
            .lock()
            .map_err(|_| KeyStoreError::Store("property map lock poisoned".into()))
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        self.entries()?.insert(key.to_owned(), value.to_owned());
        tracing::debug!(key, "property stored");
        Ok(())
    }
}

// ── JSON file ──────────────────────────────────────────────────────

/// A flat JSON object (`{"key": "value", ...}`) rewritten atomically on
/// every `set`. A missing file reads as empty.
#[derive(Debug)]
pub struct JsonFilePropertyStore {
    path: PathBuf,
    // Serializes read-modify-write within this process.
    write_lock: Mutex<()>,
}

impl JsonFilePropertyStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, KeyStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(KeyStoreError::io(
                    format!("reading property store {}", self.path.display()),
                    e,
                ))
            }
        };
        serde_json::from_str(&contents).map_err(|e| {
            KeyStoreError::Store(format!("cannot parse {}: {e}", self.path.display()))
        })
    }
}

impl PropertyStore for JsonFilePropertyStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| KeyStoreError::Store("property file lock poisoned".into()))?;

        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| KeyStoreError::Store(format!("cannot serialize properties: {e}")))?;
        write_private_atomic(&self.path, json.as_bytes())?;

        tracing::debug!(key, path = %self.path.display(), "property stored");
        Ok(())
    }
}

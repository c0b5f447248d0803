// src/storage.rs
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::error::{AppError, Result};

// --- Storage Keys ---

pub const KEY_SCHEDULE_DATA: &str = "schedule_data";
pub const KEY_THEME: &str = "schedule_theme";
pub const KEY_SELECTED_MONTH: &str = "selected_month";
pub const KEY_SELECTED_YEAR: &str = "selected_year";
pub const KEY_GROUP_COLORS: &str = "group_colors";
pub const KEY_GROUP_RANGES: &str = "group_ranges";

// --- Key/Value Collaborator ---

/// String key/value persistence. Values are opaque strings, usually JSON.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Reads and deserializes a value. Missing, unreadable or corrupt entries
/// come back as `None` so callers can fall back to defaults.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read '{}' from store: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Stored '{}' is not valid JSON, using default: {}", key, e);
            None
        }
    }
}

/// Serializes and writes a value. Failures are logged and dropped.
pub fn save_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(AppError::from)
        .and_then(|json| store.set(key, &json));
    if let Err(e) = result {
        error!("Failed to persist '{}': {}", key, e);
    }
}

/// Removes a key. Failures are logged and dropped.
pub fn remove_key(store: &mut dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        error!("Failed to remove '{}': {}", key, e);
    }
}

// --- In-Memory Store ---

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// --- JSON File Store ---

/// Whole-file JSON object snapshot, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable or corrupt one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_entries(&path);
        debug!("Opened store {:?} with {} keys", path, entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(path: &Path) -> BTreeMap<String, String> {
        if !path.exists() {
            return BTreeMap::new();
        }

        let json_string = match fs::read_to_string(path) {
            Ok(json_string) => json_string,
            Err(e) => {
                warn!("Store file {:?} could not be read, starting empty: {}", path, e);
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&json_string).unwrap_or_else(|e| {
            warn!("Store file {:?} is corrupt, starting empty: {}", path, e);
            BTreeMap::new()
        })
    }

    // Write to a sibling temp file and rename over the target
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("creating {:?}: {}", parent, e)))?;
        }

        let json_string = serde_json::to_string_pretty(&self.entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json_string)
            .map_err(|e| AppError::Storage(format!("writing {:?}: {}", tmp_path, e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AppError::Storage(format!("replacing {:?}: {}", self.path, e)))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            // keep memory in step with disk
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if let Some(old) = self.entries.remove(key) {
            if let Err(e) = self.persist() {
                self.entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }
}

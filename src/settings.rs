//! Persisted key/value settings (last used model and port).
//!
//! Stored as a flat TOML table, by default at
//! `~/.config/camctl/settings.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key under which the last bound model is stored.
pub const MODEL_KEY: &str = "model";
/// Key under which the last bound port path is stored.
pub const PORT_KEY: &str = "port";

/// Errors that can occur while reading or writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write settings file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// String settings store.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Settings backed by a TOML file. Every `set` rewrites the file.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Load settings from `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| SettingsError::Read {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.clone(),
                source: e,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// Empty store that will write to `path` on first `set`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        let content = toml::to_string(&self.values)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                    path: self.path.clone(),
                    source: e,
                })?;
            }
        }
        std::fs::write(&self.path, content).map_err(|e| SettingsError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// In-memory settings. Clones share the same values, so a test can keep a
/// handle while the session owns another. Test support only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a value without counting it as a write.
    pub fn with(self, key: &str, value: &str) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|i| i.writes).unwrap_or(0)
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok()?.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(key.to_string(), value.to_string());
            inner.writes += 1;
        }
        Ok(())
    }
}

//! Configuration file handling for camctl.
//!
//! Loads configuration from `~/.config/camctl/config.toml`, or from the
//! path in `CAMCTL_CONFIG`. The config only supplies starting values;
//! command-line flags are applied on top in the order they appear.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::session::SessionState;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "CAMCTL_CONFIG";

/// Configuration file structure for camctl.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Remote folder operations start in
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Whether "all" operations descend into subfolders
    #[serde(default = "default_true")]
    pub recurse: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            recurse: true,
        }
    }
}

/// Starting device selection, overridden by `--camera`, `--port`, `--speed`.
#[derive(Debug, Deserialize, Default)]
pub struct TargetConfig {
    pub model: Option<String>,
    pub port: Option<String>,
    pub speed: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SettingsConfig {
    /// Where the last used model and port are persisted
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BrowseConfig {
    /// Local directory presented by the Directory Browse driver
    pub root: Option<PathBuf>,
}

fn default_folder() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from `CAMCTL_CONFIG` if set, otherwise the default path.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load(explicit.as_deref())
    }

    /// Initial session state derived from this config.
    pub fn session_state(&self) -> SessionState {
        SessionState {
            model: self.target.model.clone(),
            port: self.target.port.as_deref().map(crate::target::guess_port),
            speed: self.target.speed,
            folder: self.session.folder.clone(),
            recurse: self.session.recurse,
            ..SessionState::default()
        }
    }

    /// Path of the persisted settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.settings.path.clone().unwrap_or_else(|| config_dir().join("settings.toml"))
    }

    /// Root directory for the Directory Browse driver.
    pub fn browse_root(&self) -> PathBuf {
        self.browse.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("camctl")
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    config_dir().join("config.toml")
}

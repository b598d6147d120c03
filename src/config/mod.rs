//! Configuration loading.
//!
//! `sage.toml` is looked up in the platform config dir (or passed with
//! `--config`). Every field has a default, so running with no file at all
//! yields a working bot; a present file only overrides what it names.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    pub storage: StorageConfig,
    pub responder: ResponderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Defaults to `sage.db` under the platform data dir.
    pub db_path: Option<PathBuf>,
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Questions a user may trigger per rate-limit window.
    pub max_per_window: usize,
    /// Sliding rate-limit window, seconds.
    pub window_secs: u64,
    /// Fixed FAQ-answering cooldown, milliseconds.
    pub cooldown_ms: i64,
    /// Reaction feedback collection window, seconds.
    pub feedback_window_secs: u64,
    /// How many related FAQs to offer on a no-match.
    pub related_limit: usize,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_per_window: 5,
            window_secs: 60,
            cooldown_ms: 3000,
            feedback_window_secs: 60,
            related_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8490,
        }
    }
}

impl SageConfig {
    /// Load configuration. An explicit path must exist; the default location
    /// is optional and silently falls back to defaults when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Resolved database path (config override or platform data dir).
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.db_path {
            return path.clone();
        }
        ProjectDirs::from("", "", "sage")
            .map(|dirs| dirs.data_dir().join("sage.db"))
            .unwrap_or_else(|| PathBuf::from("sage.db"))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sage").map(|dirs| dirs.config_dir().join("sage.toml"))
    }
}

//! Shared config utilities for loading/saving JSON config files
//! and resolving API keys from fields or environment variables.

use crate::imagegen::ImageGenSystemConfig;
use crate::prompts::PromptGenConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const APP_DIR: &str = "image-weaver";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Top-level configuration for the weaver: logging, output location and
/// the two external services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaverConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Where generated images are written. `None` means the platform data dir.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub prompts: PromptGenConfig,
    #[serde(default)]
    pub imagegen: ImageGenSystemConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: None,
            prompts: PromptGenConfig::default(),
            imagegen: ImageGenSystemConfig::default(),
        }
    }
}

impl WeaverConfig {
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }
}

/// `<config_dir>/image-weaver/config.json`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

/// `<data_dir>/image-weaver/generated_images`
pub fn default_output_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("generated_images")
}

/// Generic load for any Serde config type with a `Default` implementation.
/// A missing file yields `T::default()`; an unreadable or malformed one is an
/// error so a typo never silently turns into defaults.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> Result<T, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(label, path = %path.display(), "no config file, using defaults");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = serde_json::from_str::<T>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(label, path = %path.display(), "loaded config");
    Ok(config)
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T, label: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(label, path = %path.display(), "saved config");
    Ok(())
}

/// Resolve an API key: check the direct `api_key` field first,
/// then fall back to reading the environment variable named in `api_key_env`.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Option<String> {
    if let Some(ref key) = api_key {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }
    if let Some(ref env_var) = api_key_env {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    None
}

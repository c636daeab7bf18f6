//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::fs;

use crate::archive::config::ArchiveConfig;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "COMIC_SHELF_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Comic library configuration
    pub comics: ComicsConfig,
    /// Cross-origin access configuration
    pub cors: CorsConfig,
    /// Archive backend configuration
    pub archive: ArchiveConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// File this configuration was read from, `None` for built-in defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
}

/// Comic library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicsConfig {
    /// Directory every client path is resolved against
    pub root: PathBuf,
}

/// Cross-origin access configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Ordered allow-list: `*`, `scheme://host` or a bare host
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
        }
    }
}

impl Default for ComicsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./comics"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found
    ///
    /// Runs before logging is set up, so nothing is logged here; `source`
    /// records where the values came from. Environment overrides are applied
    /// separately with [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&config_path).exists() {
            Self::load_from(Path::new(&config_path))
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific YAML file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_yaml::from_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply environment overrides; call once logging is up
    pub fn apply_env(&mut self) {
        self.archive.apply_env();
    }
}

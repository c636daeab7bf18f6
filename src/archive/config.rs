//! Configuration for archive backends

use crate::archive::{ArchiveBackend, mock_store::MockArchiveBackend, seven_zip::SevenZipBackend, zip_store::ZipBackend};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};

/// Available archive backends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ArchiveBackendKind {
    SevenZip,
    Zip,
    Mock,
}

impl Default for ArchiveBackendKind {
    fn default() -> Self {
        ArchiveBackendKind::SevenZip
    }
}

impl std::str::FromStr for ArchiveBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sevenzip" | "7z" | "7zip" | "7-zip" => Ok(ArchiveBackendKind::SevenZip),
            "zip" => Ok(ArchiveBackendKind::Zip),
            "mock" => Ok(ArchiveBackendKind::Mock),
            _ => Err(format!("Unknown archive backend: {}", s))
        }
    }
}

/// Archive backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive backend type
    pub backend: ArchiveBackendKind,
    /// Executable used by the SevenZip backend
    pub seven_zip_path: String,
    /// Directory for temporary extraction output
    pub temp_path: String,
    /// Upper bound for a single list or extract call, in seconds
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            backend: ArchiveBackendKind::default(),
            seven_zip_path: "7z".to_string(),
            temp_path: env::temp_dir().display().to_string(),
            timeout_secs: 30,
        }
    }
}

impl ArchiveConfig {
    /// Apply the `ARCHIVE_BACKEND` environment override, if set
    pub fn apply_env(&mut self) {
        if let Ok(backend_str) = env::var("ARCHIVE_BACKEND") {
            match backend_str.parse::<ArchiveBackendKind>() {
                Ok(backend) => {
                    info!("Using archive backend from environment: {:?}", backend);
                    self.backend = backend;
                }
                Err(e) => {
                    warn!("Invalid archive backend in environment: {}. Keeping {:?}.", e, self.backend);
                }
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Create an archive backend based on the configuration
    pub fn create_backend(&self) -> Arc<dyn ArchiveBackend> {
        match self.backend {
            ArchiveBackendKind::SevenZip => {
                info!("Using 7z archive backend with executable: {}, temp_path: {}", self.seven_zip_path, self.temp_path);
                Arc::new(SevenZipBackend::new(&self.seven_zip_path, PathBuf::from(&self.temp_path)))
            }
            ArchiveBackendKind::Zip => {
                info!("Using zip archive backend with temp_path: {}", self.temp_path);
                Arc::new(ZipBackend::new(PathBuf::from(&self.temp_path)))
            }
            ArchiveBackendKind::Mock => {
                info!("Using mock archive backend");
                Arc::new(MockArchiveBackend::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_archive_backend_from_str() {
        assert_eq!("sevenzip".parse::<ArchiveBackendKind>().unwrap(), ArchiveBackendKind::SevenZip);
        assert_eq!("7z".parse::<ArchiveBackendKind>().unwrap(), ArchiveBackendKind::SevenZip);
        assert_eq!("7-Zip".parse::<ArchiveBackendKind>().unwrap(), ArchiveBackendKind::SevenZip);
        assert_eq!("ZIP".parse::<ArchiveBackendKind>().unwrap(), ArchiveBackendKind::Zip);
        assert_eq!("mock".parse::<ArchiveBackendKind>().unwrap(), ArchiveBackendKind::Mock);

        assert!("rar".parse::<ArchiveBackendKind>().is_err());
    }

    #[test]
    fn test_archive_config_default() {
        let config = ArchiveConfig::default();
        assert_eq!(config.backend, ArchiveBackendKind::SevenZip);
        assert_eq!(config.seven_zip_path, "7z");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_never_zero() {
        let config = ArchiveConfig { timeout_secs: 0, ..ArchiveConfig::default() };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    #[serial]
    fn test_backend_env_override() {
        let mut config = ArchiveConfig::default();
        env::set_var("ARCHIVE_BACKEND", "mock");
        config.apply_env();
        assert_eq!(config.backend, ArchiveBackendKind::Mock);

        env::set_var("ARCHIVE_BACKEND", "tarball");
        config.apply_env();
        assert_eq!(config.backend, ArchiveBackendKind::Mock);
        env::remove_var("ARCHIVE_BACKEND");
    }

    #[test]
    fn test_create_backend() {
        for backend in [ArchiveBackendKind::SevenZip, ArchiveBackendKind::Zip, ArchiveBackendKind::Mock] {
            let config = ArchiveConfig { backend, ..ArchiveConfig::default() };
            let _backend = config.create_backend();
        }
    }
}

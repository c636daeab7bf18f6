//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use actix_web::web;
use log::info;

use crate::archive::ArchiveBackend;
use crate::archive::mock_store::MockArchiveBackend;
use crate::service::{ComicService, DirectoryService};
use crate::config::AppConfig;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub comic_service: Arc<ComicService>,
    pub directory_service: Arc<DirectoryService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Self {
        info!("Initializing application state with comics root: {}", config.comics.root.display());
        let backend = config.archive.create_backend();
        Self::with_backend(config, backend)
    }

    /// Create application state around an explicit archive backend
    pub fn with_backend(config: AppConfig, backend: Arc<dyn ArchiveBackend>) -> Self {
        let comic_service = Arc::new(ComicService::new(
            backend,
            config.comics.root.clone(),
            config.archive.timeout(),
        ));
        let directory_service = Arc::new(DirectoryService::new(config.comics.root.clone()));

        info!("Application state initialized with {} allowed origin rule(s)", config.cors.allowed_origins.len());
        Self {
            comic_service,
            directory_service,
            config,
        }
    }

    /// Create application state for testing with a mock archive backend
    pub fn new_for_testing(config: AppConfig) -> Self {
        Self::with_backend(config, Arc::new(MockArchiveBackend::new()))
    }
}

/// Helper function to extract app state from Actix-web data
pub fn extract_app_state(data: &web::Data<AppState>) -> &AppState {
    data.as_ref()
}

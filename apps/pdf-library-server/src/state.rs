//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::library::PdfLibrary;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    library: PdfLibrary,
}

impl AppState {
    /// Create a new application state over an initialized pool
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let library = PdfLibrary::new(db, config.library.clone());

        Self {
            inner: Arc::new(AppStateInner { config, library }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the PDF library service
    pub fn library(&self) -> &PdfLibrary {
        &self.inner.library
    }

    /// Release the database pool
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.library.close().await;
    }
}

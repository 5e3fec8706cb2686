//! Configuration management for the PDF Library server

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// In-memory configuration used by tests and ephemeral runs
    pub fn in_memory() -> Self {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    /// Whether the URL points at an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Limits applied by the PDF library service
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Section page size used when the request omits `size`
    pub default_page_size: u32,
    /// Larger requested page sizes are clamped to this value
    pub max_page_size: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            max_upload_bytes: 50 * 1024 * 1024,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: "sqlite:./pdf_library.db".to_string(),
                max_connections: 5,
            },
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            library: LibraryConfig {
                max_upload_bytes: parse_var(
                    "MAX_UPLOAD_BYTES",
                    defaults.library.max_upload_bytes,
                )?,
                default_page_size: parse_var(
                    "DEFAULT_PAGE_SIZE",
                    defaults.library.default_page_size,
                )?,
                max_page_size: parse_var("MAX_PAGE_SIZE", defaults.library.max_page_size)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => parse_value(var, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        })
}

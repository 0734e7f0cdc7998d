//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the glossary search pipeline, supporting
//! TOML files and environment variable overrides with validation and
//! type-safe access to all settings.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`GLOSSARY_*`)
//! 2. Configuration file
//! 3. Default values
//!
//! ## Usage
//! ```rust,no_run
//! use glossary_search::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Backend port: {}", config.server.port);
//! ```

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend server configuration
    pub server: ServerConfig,
    /// Edge proxy configuration
    pub edge: EdgeConfig,
    /// Rate limiting budgets
    pub rate_limit: RateLimitConfig,
    /// Search service behavior
    pub search: SearchServiceConfig,
    /// Term store settings
    pub storage: StorageConfig,
    /// Client controller behavior
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Edge proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Edge bind address
    pub host: String,
    /// Edge port
    pub port: u16,
    /// Backend base URL the proxy forwards to. Absence is a hard error on
    /// the request path, never a silent default.
    pub backend_base_url: Option<String>,
    /// Forward request timeout in seconds
    pub forward_timeout_seconds: u64,
}

/// Rate limiting budgets (fixed windows)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per identity per window, across all operations
    pub global_limit: u32,
    /// Requests allowed per identity per window on the search operation
    pub search_limit: u32,
    /// Window time-to-live in seconds
    pub window_seconds: u64,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchServiceConfig {
    /// Maximum number of results per query
    pub max_results: usize,
    /// Minimum sanitized query length the service will execute
    pub min_query_length: usize,
    /// Maximum sanitized query length the service will execute
    pub max_query_length: usize,
}

/// Term store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory path
    pub db_path: PathBuf,
}

/// Client controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Edge search endpoint the controller issues requests against
    pub endpoint: String,
    /// Quiet period before a pending query is dispatched, in milliseconds
    pub debounce_ms: u64,
    /// Locale used when composing user-facing error text
    pub locale: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl RateLimitConfig {
    /// Window TTL as a `Duration`
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl ClientConfig {
    /// Debounce quiet period as a `Duration`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| SearchError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("GLOSSARY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GLOSSARY_PORT") {
            self.server.port = port.parse().map_err(|_| SearchError::Config {
                message: "Invalid port number in GLOSSARY_PORT".to_string(),
            })?;
        }
        if let Ok(base_url) = std::env::var("GLOSSARY_BACKEND_BASE_URL") {
            self.edge.backend_base_url = Some(base_url);
        }
        if let Ok(db_path) = std::env::var("GLOSSARY_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(level) = std::env::var("GLOSSARY_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(SearchError::Config {
                message: "server.port cannot be zero".to_string(),
            });
        }

        if self.rate_limit.global_limit == 0 || self.rate_limit.search_limit == 0 {
            return Err(SearchError::Config {
                message: "rate limit budgets must be greater than zero".to_string(),
            });
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(SearchError::Config {
                message: "rate_limit.window_seconds must be greater than zero".to_string(),
            });
        }

        if self.search.min_query_length > self.search.max_query_length {
            return Err(SearchError::Config {
                message: "search.min_query_length cannot exceed max_query_length".to_string(),
            });
        }

        if self.search.max_results == 0 {
            return Err(SearchError::Config {
                message: "search.max_results must be greater than zero".to_string(),
            });
        }

        if let Some(url) = &self.edge.backend_base_url {
            if url.trim().is_empty() {
                return Err(SearchError::Config {
                    message: "edge.backend_base_url must not be empty when set".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Fail closed when the edge tier is started without a backend address.
    /// Deployment-time counterpart of the per-request check.
    pub fn require_backend_base_url(&self) -> Result<&str> {
        self.edge
            .backend_base_url
            .as_deref()
            .ok_or_else(|| SearchError::Config {
                message: "edge.backend_base_url is not set".to_string(),
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            edge: EdgeConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                backend_base_url: None,
                forward_timeout_seconds: 10,
            },
            rate_limit: RateLimitConfig {
                global_limit: 60,
                search_limit: 20,
                window_seconds: 60,
            },
            search: SearchServiceConfig {
                max_results: 10,
                min_query_length: 2,
                max_query_length: 50,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("./data/glossary.db"),
            },
            client: ClientConfig {
                endpoint: "http://127.0.0.1:3000/api/search".to_string(),
                debounce_ms: 250,
                locale: "ru".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

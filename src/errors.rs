//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the glossary search pipeline, providing
//! the error taxonomy shared by the backend service, the edge proxy, and
//! the client controller.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from pipeline components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Validation, Throttling, Backend, Configuration,
//!   Storage, Cancellation
//!
//! ## Key Features
//! - Validation errors never reach the network
//! - Backend failures are normalized at the edge boundary before reaching
//!   the client; raw exception text is never displayed
//! - Cancellation is a coordination signal, not a user-facing failure

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error taxonomy for the search pipeline
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query failed boundary validation (e.g. too long); client-local,
    /// reported before any network activity
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A fixed-window budget was exceeded before query execution
    #[error("Rate limit exceeded for {scope}")]
    Throttled {
        scope: String,
        retry_after_seconds: u64,
    },

    /// Non-success backend response or network failure, normalized at the
    /// edge so backend internals never leak to the client
    #[error("Backend error")]
    BackendUnavailable { details: String },

    /// Missing or invalid configuration; fatal for the request that hit it
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// In-flight request superseded by a newer one. Internal coordination
    /// only; must never populate user-visible error state
    #[error("Request cancelled")]
    Cancelled,

    /// Term store errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Record encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SearchError {
    /// Check if the error is recoverable (client may retry after backoff)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::Throttled { .. } | SearchError::BackendUnavailable { .. }
        )
    }

    /// Whether this error represents benign supersession rather than a
    /// genuine failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            SearchError::Validation { .. } => "validation",
            SearchError::Throttled { .. } => "throttle",
            SearchError::BackendUnavailable { .. } | SearchError::Http(_) => "backend",
            SearchError::Config { .. } | SearchError::Toml(_) => "configuration",
            SearchError::Cancelled => "cancellation",
            SearchError::Database(_) | SearchError::Serialization(_) => "storage",
            SearchError::Json(_) | SearchError::Io(_) | SearchError::Internal { .. } => "generic",
        }
    }
}

// Helper macro for common error patterns
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::SearchError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::SearchError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}

//! # Incremental Glossary Search Pipeline
//!
//! ## Overview
//! This library implements the end-to-end request pipeline for an
//! incremental ("search as you type") glossary lookup: a debounced client
//! controller, a same-origin edge proxy, and a rate-limited backend service
//! executing bounded case-insensitive prefix matches against a persisted
//! term store.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `store`: Persistent term storage with an ordered case-folded index
//! - `query`: Query sanitization and boundary validation
//! - `rate_limit`: Fixed-window request limiting keyed by client identity
//! - `service`: Search service combining sanitization, bounds, and lookup
//! - `api`: Backend REST endpoint exposing the search service
//! - `edge`: Same-origin proxy that revalidates and forwards queries
//! - `client`: Debouncing, cancelling search controller with view state
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: User query strings (incremental keystrokes)
//! - **Output**: At most 10 matching terms, ascending by display key
//! - **Guarantee**: Only the most recently issued request's result is ever
//!   applied to visible state, enforced via cooperative cancellation
//!
//! ## Usage
//! ```rust,no_run
//! use glossary_search::{Config, SearchService, TermStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let store = Arc::new(TermStore::open(config.storage.clone()).await?);
//!     let service = SearchService::new(config.search.clone(), store);
//!     let results = service.search("aba").await?;
//!     println!("Found {} terms", results.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod client;
pub mod config;
pub mod edge;
pub mod errors;
pub mod i18n;
pub mod query;
pub mod rate_limit;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, SearchError};
pub use rate_limit::RateLimiter;
pub use service::SearchService;
pub use store::TermStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for glossary terms
pub type TermId = u64;

/// A single glossary entry: the display key plus its definition.
///
/// Immutable from the pipeline's perspective; read-only during search, with
/// lifecycle owned by the term store rather than by any request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Unique, stable identifier
    pub id: TermId,
    /// Display key the prefix match runs against
    pub term: String,
    /// Definition shown when the term is selected
    pub definition: String,
}

/// Application state shared across backend request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub service: Arc<service::SearchService>,
    /// Budget across all operations per identity
    pub global_limiter: Arc<rate_limit::RateLimiter>,
    /// Stricter budget on the search operation
    pub search_limiter: Arc<rate_limit::RateLimiter>,
}

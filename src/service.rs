//! # Search Service Module
//!
//! ## Purpose
//! The backend search operation: sanitizes input, enforces length bounds,
//! and executes a bounded case-insensitive prefix lookup against the term
//! store.
//!
//! ## Input/Output Specification
//! - **Input**: Raw query strings (possibly malformed)
//! - **Output**: At most `max_results` terms ascending by display key
//! - **Policy**: Lengths outside [min, max] yield an empty sequence, never
//!   an error — "no results for insufficient input"

use crate::config::SearchServiceConfig;
use crate::errors::Result;
use crate::query;
use crate::store::TermStore;
use crate::Term;
use std::sync::Arc;

/// Search service over the term store
pub struct SearchService {
    config: SearchServiceConfig,
    store: Arc<TermStore>,
}

impl SearchService {
    /// Create a new search service
    pub fn new(config: SearchServiceConfig, store: Arc<TermStore>) -> Self {
        Self { config, store }
    }

    /// Execute a search for `raw`.
    ///
    /// Never raises for malformed input; out-of-bounds queries return an
    /// empty sequence without touching the store.
    pub async fn search(&self, raw: &str) -> Result<Vec<Term>> {
        let sanitized = query::sanitize(raw);

        if !query::within_service_bounds(
            &sanitized,
            self.config.min_query_length,
            self.config.max_query_length,
        ) {
            tracing::debug!(len = sanitized.len(), "Query outside service bounds");
            return Ok(Vec::new());
        }

        self.store
            .prefix_search(&sanitized, self.config.max_results)
            .await
    }

    /// Health check: verify store connectivity
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }

    /// The underlying term store
    pub fn store(&self) -> &Arc<TermStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchServiceConfig, StorageConfig};
    use crate::TermId;

    async fn service_with_terms(terms: &[(TermId, &str)]) -> (SearchService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TermStore::open(StorageConfig {
            db_path: dir.path().join("terms.db"),
        })
        .await
        .unwrap();

        let records: Vec<Term> = terms
            .iter()
            .map(|(id, term)| Term {
                id: *id,
                term: term.to_string(),
                definition: format!("definition of {}", term),
            })
            .collect();
        store.insert_terms(&records).await.unwrap();

        let service = SearchService::new(
            SearchServiceConfig {
                max_results: 10,
                min_query_length: 2,
                max_query_length: 50,
            },
            Arc::new(store),
        );
        (service, dir)
    }

    #[tokio::test]
    async fn test_short_query_skips_store_entirely() {
        let (service, _dir) = service_with_terms(&[(1, "Abacus")]).await;

        assert!(service.search("a").await.unwrap().is_empty());
        assert!(service.search("").await.unwrap().is_empty());
        assert!(service.search("  \0 ").await.unwrap().is_empty());
        assert_eq!(service.store().queries_served(), 0);
    }

    #[tokio::test]
    async fn test_overlong_query_returns_empty_not_error() {
        let (service, _dir) = service_with_terms(&[(1, "Abacus")]).await;

        let long = "a".repeat(51);
        assert!(service.search(&long).await.unwrap().is_empty());
        assert_eq!(service.store().queries_served(), 0);

        // Exactly 50 is still executed
        let edge = "a".repeat(50);
        assert!(service.search(&edge).await.unwrap().is_empty());
        assert_eq!(service.store().queries_served(), 1);
    }

    #[tokio::test]
    async fn test_sanitization_applies_before_bounds() {
        let (service, _dir) = service_with_terms(&[(1, "Abacus"), (2, "abandon")]).await;

        // NULs stripped and whitespace trimmed before matching
        let results = service.search("  ab\0  ").await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_round_trip_ordering() {
        let (service, _dir) = service_with_terms(&[(2, "abandon"), (1, "Abacus")]).await;

        let results = service.search("ab").await.unwrap();
        let keys: Vec<&str> = results.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(keys, vec!["Abacus", "abandon"]);
        assert_eq!(results[0].id, 1);
        assert!(!results[0].definition.is_empty());
    }

    #[tokio::test]
    async fn test_result_count_bounded() {
        let terms: Vec<(TermId, String)> = (0..25)
            .map(|i| (i as TermId, format!("prefix{:02}", i)))
            .collect();
        let borrowed: Vec<(TermId, &str)> =
            terms.iter().map(|(id, t)| (*id, t.as_str())).collect();
        let (service, _dir) = service_with_terms(&borrowed).await;

        let results = service.search("prefix").await.unwrap();
        assert_eq!(results.len(), 10);
    }
}

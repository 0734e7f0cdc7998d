//! # Term Store Module
//!
//! ## Purpose
//! Persistent storage for glossary terms with an ordered, case-folded
//! in-memory index supporting efficient "starts with" lookups.
//!
//! ## Input/Output Specification
//! - **Input**: Term records (id, display key, definition), sanitized
//!   bounded prefixes
//! - **Output**: Matching terms ordered ascending by case-folded display
//!   key, ties broken by id
//! - **Storage**: Sled embedded database, bincode-encoded records
//!
//! ## Key Features
//! - Read-only on the search path; no side effects beyond a served-query
//!   counter
//! - Index keyed by (lowercased display key, id) so result order is
//!   deterministic
//! - The query is used strictly as a literal prefix, never interpolated
//!   into a pattern language

use crate::config::StorageConfig;
use crate::errors::{Result, SearchError};
use crate::{Term, TermId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Persistent term store with a case-folded prefix index
pub struct TermStore {
    config: StorageConfig,
    db: sled::Db,
    terms_tree: sled::Tree,
    /// Scratch tree for operational values. Kept apart from `terms_tree`,
    /// whose every value must deserialize as a `Term` on open.
    metadata_tree: sled::Tree,
    /// Ordered index: (case-folded display key, id) -> record id.
    /// The composite key makes tie order deterministic.
    index: RwLock<BTreeMap<(String, TermId), TermId>>,
    queries_served: AtomicU64,
}

/// Store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_terms: usize,
    pub queries_served: u64,
    pub database_size_bytes: u64,
}

/// Collation used by the prefix index: simple lowercase fold.
fn fold_key(term: &str) -> String {
    term.to_lowercase()
}

impl TermStore {
    /// Open the store and rebuild the in-memory index from disk
    pub async fn open(config: StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = sled::open(&config.db_path)?;
        let terms_tree = db.open_tree("terms")?;
        let metadata_tree = db.open_tree("metadata")?;

        let mut index = BTreeMap::new();
        for entry in terms_tree.iter() {
            let (_, value) = entry?;
            let term: Term = bincode::deserialize(&value)?;
            index.insert((fold_key(&term.term), term.id), term.id);
        }

        tracing::info!("Term store opened with {} terms", index.len());

        Ok(Self {
            config,
            db,
            terms_tree,
            metadata_tree,
            index: RwLock::new(index),
            queries_served: AtomicU64::new(0),
        })
    }

    /// Insert or replace a single term
    pub async fn insert_term(&self, term: &Term) -> Result<()> {
        let value = bincode::serialize(term)?;

        if let Some(previous) = self
            .terms_tree
            .insert(term.id.to_be_bytes(), value)?
        {
            // Replacing a record may change its display key; drop the old
            // index entry so the index never holds stale keys.
            let old: Term = bincode::deserialize(&previous)?;
            self.index.write().remove(&(fold_key(&old.term), old.id));
        }

        self.index
            .write()
            .insert((fold_key(&term.term), term.id), term.id);

        tracing::debug!(id = term.id, term = %term.term, "Stored term");
        Ok(())
    }

    /// Batch insert terms and flush to disk
    pub async fn insert_terms(&self, terms: &[Term]) -> Result<usize> {
        for term in terms {
            self.insert_term(term).await?;
        }

        self.db.flush_async().await?;

        tracing::info!("Batch stored {} terms", terms.len());
        Ok(terms.len())
    }

    /// Case-insensitive prefix search over display keys.
    ///
    /// Returns at most `limit` terms ascending by the folded key, ties
    /// ascending by id. Read-only.
    pub async fn prefix_search(&self, prefix: &str, limit: usize) -> Result<Vec<Term>> {
        self.queries_served.fetch_add(1, Ordering::Relaxed);

        let folded = fold_key(prefix);
        let ids: Vec<TermId> = {
            let index = self.index.read();
            index
                .range((folded.clone(), TermId::MIN)..)
                .take_while(|(key, _)| key.0.starts_with(&folded))
                .take(limit)
                .map(|(_, id)| *id)
                .collect()
        };

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = self.terms_tree.get(id.to_be_bytes())? {
                let term: Term = bincode::deserialize(&value)?;
                results.push(term);
            }
        }

        Ok(results)
    }

    /// Number of stored terms
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Whether the store holds no terms
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Number of prefix queries served since the store was opened
    pub fn queries_served(&self) -> u64 {
        self.queries_served.load(Ordering::Relaxed)
    }

    /// Get store statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_terms: self.len(),
            queries_served: self.queries_served(),
            database_size_bytes: self.db.size_on_disk()?,
        })
    }

    /// Health check: round-trip a scratch key through the metadata tree.
    /// Never touches `terms_tree`, so a crash mid-check cannot leave a
    /// non-term value where `open` would try to decode it.
    pub async fn health_check(&self) -> Result<()> {
        let test_key = b"health_check";
        let test_value = b"ok";

        self.metadata_tree.insert(test_key, test_value)?;

        let result = self.metadata_tree.get(test_key)?;
        if result.is_none() {
            return Err(SearchError::Internal {
                message: format!(
                    "Health check value not found in {:?}",
                    self.config.db_path
                ),
            });
        }

        self.metadata_tree.remove(test_key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    async fn open_temp_store() -> (TermStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            db_path: dir.path().join("terms.db"),
        };
        let store = TermStore::open(config).await.unwrap();
        (store, dir)
    }

    fn term(id: TermId, term: &str) -> Term {
        Term {
            id,
            term: term.to_string(),
            definition: format!("definition of {}", term),
        }
    }

    #[tokio::test]
    async fn test_prefix_search_is_case_insensitive_and_ordered() {
        let (store, _dir) = open_temp_store().await;
        store
            .insert_terms(&[
                term(1, "Abacus"),
                term(2, "abandon"),
                term(3, "Zebra"),
                term(4, "abate"),
            ])
            .await
            .unwrap();

        let results = store.prefix_search("ab", 10).await.unwrap();
        let keys: Vec<&str> = results.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(keys, vec!["Abacus", "abandon", "abate"]);

        // Uppercase prefix matches the same set
        let results = store.prefix_search("AB", 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].definition, "definition of Abacus");
    }

    #[tokio::test]
    async fn test_prefix_search_respects_limit_and_tie_order() {
        let (store, _dir) = open_temp_store().await;
        // Same folded key, distinct ids; order must be by id
        store
            .insert_terms(&[term(9, "Node"), term(3, "node"), term(6, "NODE ring")])
            .await
            .unwrap();

        let results = store.prefix_search("node", 10).await.unwrap();
        let ids: Vec<TermId> = results.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 9, 6]);

        let results = store.prefix_search("node", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let (store, _dir) = open_temp_store().await;
        store.insert_terms(&[term(1, "Abacus")]).await.unwrap();

        let results = store.prefix_search("zz", 10).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(store.queries_served(), 1);
    }

    #[tokio::test]
    async fn test_replacing_a_term_reindexes_it() {
        let (store, _dir) = open_temp_store().await;
        store.insert_term(&term(1, "Abacus")).await.unwrap();
        store.insert_term(&term(1, "Zither")).await.unwrap();

        assert!(store.prefix_search("ab", 10).await.unwrap().is_empty());
        let results = store.prefix_search("zi", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_leftover_health_scratch_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            db_path: dir.path().join("terms.db"),
        };

        {
            let store = TermStore::open(config.clone()).await.unwrap();
            store.insert_term(&term(1, "Abacus")).await.unwrap();
            store.health_check().await.unwrap();
        }

        // A crash between the scratch insert and its removal leaves the
        // raw value behind; open must still succeed
        {
            let db = sled::open(&config.db_path).unwrap();
            let metadata = db.open_tree("metadata").unwrap();
            metadata.insert(b"health_check", b"ok").unwrap();
            db.flush().unwrap();
        }

        let store = TermStore::open(config).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.prefix_search("ab", 10).await.unwrap().len(), 1);
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_index_rebuilt_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            db_path: dir.path().join("terms.db"),
        };

        {
            let store = TermStore::open(config.clone()).await.unwrap();
            store
                .insert_terms(&[term(1, "Abacus"), term(2, "abandon")])
                .await
                .unwrap();
        }

        let store = TermStore::open(config).await.unwrap();
        assert_eq!(store.len(), 2);
        let results = store.prefix_search("ab", 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}

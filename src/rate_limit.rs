//! # Rate Limiting Module
//!
//! ## Purpose
//! Fixed-window request limiting keyed by client identity, guarding the
//! search endpoint before any query execution.
//!
//! ## Input/Output Specification
//! - **Input**: Client identity (e.g. network origin) per request
//! - **Output**: Pass/throttle verdict with retry-after on rejection
//! - **Semantics**: Fixed window, not sliding; bursts at window boundaries
//!   are an accepted trade-off for simplicity
//!
//! ## Key Features
//! - Increment-and-compare under the map entry lock, so concurrent
//!   requests never undercount
//! - Injectable component with explicit lifecycle: created once at process
//!   start, shared by reference across request handlers
//! - The window resets strictly after its TTL elapses, independent of
//!   request activity

use crate::errors::{Result, SearchError};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Per-identity window state
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    started_at: Instant,
}

/// Fixed-window rate limiter for one scope (e.g. "global", "search")
pub struct RateLimiter {
    scope: &'static str,
    budget: u32,
    window: Duration,
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    /// Create a limiter allowing `budget` requests per identity per window
    pub fn new(scope: &'static str, budget: u32, window: Duration) -> Self {
        Self {
            scope,
            budget,
            window,
            windows: DashMap::new(),
        }
    }

    /// Record one request for `identity` and enforce the budget.
    ///
    /// The entry guard holds the shard lock for the whole
    /// increment-and-compare, so the counter never undercounts under
    /// concurrent load.
    pub fn check(&self, identity: &str) -> Result<()> {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(RateWindow {
                count: 0,
                started_at: now,
            });

        if now.duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        entry.count += 1;

        if entry.count > self.budget {
            let elapsed = now.duration_since(entry.started_at);
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_seconds = remaining.as_secs().max(1);

            tracing::warn!(
                scope = self.scope,
                identity,
                count = entry.count,
                budget = self.budget,
                "Rate limit exceeded"
            );

            return Err(SearchError::Throttled {
                scope: self.scope.to_string(),
                retry_after_seconds,
            });
        }

        Ok(())
    }

    /// Drop windows whose TTL has elapsed, bounding map growth across many
    /// distinct identities
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started_at) < self.window);
    }

    /// Number of identities currently tracked
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }
}

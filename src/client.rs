//! # Client Search Controller Module
//!
//! ## Purpose
//! Owns user input state for incremental search: debounces keystrokes,
//! cancels superseded in-flight requests, and reconciles responses so only
//! the most recently issued request's result is ever shown.
//!
//! ## Input/Output Specification
//! - **Input**: A stream of raw input-change events plus user selections
//! - **Output**: View state (items, selection, loading, error) updated by
//!   at most one "winning" request per debounce cycle
//! - **Guarantee**: Last-issued-wins, not last-arrived-wins
//!
//! ## Key Features
//! - Synchronous validation on every change, before any network activity:
//!   empty input clears state, overlong input shows a local error
//! - A 250 ms timer-reset debounce coalesces a burst of keystrokes into
//!   the last one
//! - Cooperative cancellation: every outbound call carries a token; a
//!   superseded call detects the signal and stops updating state, and the
//!   cancellation never surfaces as a user-visible error
//! - Selection is independent of the debounce cycle and persists until
//!   superseded by a new search or explicit empty input

use crate::config::ClientConfig;
use crate::errors::{Result, SearchError};
use crate::i18n::Locale;
use crate::query;
use crate::{Term, TermId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Observable state the UI renders from
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Current result list, at most one request's worth
    pub items: Vec<Term>,
    /// Term whose definition is displayed
    pub selected: Option<Term>,
    /// True from dispatch until the request settles
    pub loading: bool,
    /// Human-readable failure text; never set by cancellation
    pub error: Option<String>,
}

/// Debouncing, cancelling search controller.
///
/// Must be driven from within a tokio runtime; the debounce timer and the
/// network call are cooperative tasks on the runtime's event loop.
pub struct SearchController {
    config: ClientConfig,
    locale: Locale,
    http: reqwest::Client,
    state: Arc<Mutex<ViewState>>,
    /// Token of the current debounce cycle, covering both the timer wait
    /// and the network call. Every input change cancels the occupant and
    /// installs a fresh token, so at most one cycle is ever live and only
    /// its request may reconcile results.
    cycle: Mutex<CancellationToken>,
}

impl SearchController {
    /// Create a controller issuing requests against the configured edge
    /// endpoint
    pub fn new(config: ClientConfig) -> Self {
        let locale = Locale::parse(&config.locale);
        Self {
            config,
            locale,
            http: reqwest::Client::new(),
            state: Arc::new(Mutex::new(ViewState::default())),
            cycle: Mutex::new(CancellationToken::new()),
        }
    }

    /// Cancel the current cycle (pending timer or in-flight request) and
    /// install a fresh token for the next one
    fn supersede_cycle(&self) -> CancellationToken {
        let mut current = self.cycle.lock();
        current.cancel();
        let fresh = CancellationToken::new();
        *current = fresh.clone();
        fresh
    }

    /// Handle a raw input-change event.
    ///
    /// Validation runs synchronously before any network activity; eligible
    /// changes reset the debounce timer and only the timer that survives
    /// uninterrupted dispatches a request.
    pub fn on_input(&self, raw: &str) {
        let q = query::sanitize(raw);

        // Any change supersedes the pending cycle, timer and request both
        let token = self.supersede_cycle();

        if q.is_empty() {
            let mut state = self.state.lock();
            state.items.clear();
            state.selected = None;
            state.error = None;
            state.loading = false;
            return;
        }

        if query::query_length(&q) > query::MAX_QUERY_LEN {
            let mut state = self.state.lock();
            state.items.clear();
            state.selected = None;
            state.error = Some(self.locale.messages().too_long.to_string());
            state.loading = false;
            return;
        }

        let debounce = self.config.debounce();
        let http = self.http.clone();
        let endpoint = self.config.endpoint.clone();
        let locale = self.locale;
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            // Only the timer that survives uninterrupted dispatches
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            dispatch(http, endpoint, q, locale, state, token).await;
        });
    }

    /// Select a listed result to view its definition.
    ///
    /// Returns false when `id` is not in the current result list.
    pub fn select(&self, id: TermId) -> bool {
        let mut state = self.state.lock();
        match state.items.iter().find(|t| t.id == id).cloned() {
            Some(term) => {
                state.selected = Some(term);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current view state
    pub fn state(&self) -> ViewState {
        self.state.lock().clone()
    }
}

/// Issue one search request and reconcile its outcome into view state.
///
/// The predecessor cycle was cancelled when this one began, so a slow
/// earlier response can never overwrite a faster later one.
async fn dispatch(
    http: reqwest::Client,
    endpoint: String,
    q: String,
    locale: Locale,
    state: Arc<Mutex<ViewState>>,
    token: CancellationToken,
) {
    {
        let mut state = state.lock();
        state.loading = true;
        state.error = None;
    }

    let outcome = tokio::select! {
        _ = token.cancelled() => Err(SearchError::Cancelled),
        result = fetch_results(&http, &endpoint, &q) => result,
    };

    let mut state = state.lock();
    if token.is_cancelled() {
        // Superseded: the successor owns the view state now. Existing
        // results stay untouched and no error is surfaced.
        return;
    }
    state.loading = false;

    match outcome {
        Ok(items) => {
            state.selected = items.first().cloned();
            state.items = items;
            state.error = None;
        }
        Err(e) => {
            tracing::debug!(category = e.category(), "Search request failed: {}", e);
            state.items.clear();
            state.selected = None;
            state.error = Some(error_message(&e, locale));
        }
    }
}

/// Perform the network call against the edge endpoint
async fn fetch_results(
    http: &reqwest::Client,
    endpoint: &str,
    q: &str,
) -> Result<Vec<Term>> {
    let response = http
        .get(endpoint)
        .query(&[("q", q)])
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        // The edge normalizes failures into {error} payloads safe to show
        let details = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error")?.as_str().map(String::from))
            .unwrap_or_default();
        return Err(SearchError::BackendUnavailable { details });
    }

    Ok(response.json().await?)
}

/// Compose the user-facing failure text: the payload message when present,
/// else a localized generic fallback
fn error_message(error: &SearchError, locale: Locale) -> String {
    match error {
        SearchError::BackendUnavailable { details } if !details.is_empty() => details.clone(),
        _ => locale.messages().request_failed.to_string(),
    }
}

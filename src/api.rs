//! # Backend API Module
//!
//! ## Purpose
//! REST server exposing the rate-limited search operation over the term
//! store. Consumed by the edge proxy, never directly by browsers.
//!
//! ## Input/Output Specification
//! - **Input**: `GET /terms/search?q=<string>` with percent-encoded query
//! - **Output**: JSON array of terms; `429` with a throttling payload when
//!   a budget is exceeded
//! - **Endpoints**: Search, health
//!
//! ## Key Features
//! - Both fixed-window budgets (global and search-specific) are enforced
//!   before any query execution
//! - Malformed input yields an empty array, not an error
//! - Structured error responses without internal detail

use crate::errors::{Result, SearchError};
use crate::AppState;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use std::time::Duration;

/// Backend API server
pub struct ApiServer {
    app_state: AppState,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Interval between sweeps of expired rate windows
const LIMITER_PURGE_INTERVAL: Duration = Duration::from_secs(60);

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );

        tracing::info!("Starting backend API server on {}", bind_addr);

        // Keep the keyed window store bounded across many identities
        let global_limiter = self.app_state.global_limiter.clone();
        let search_limiter = self.app_state.search_limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(LIMITER_PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                global_limiter.purge_expired();
                search_limiter.purge_expired();
            }
        });

        let app_state = self.app_state.clone();
        // The builder is dropped here so only the Send `Server` handle is
        // held across the await; `run()` stays spawnable on the runtime.
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .configure(configure)
        })
        .bind(&bind_addr)
        .map_err(|e| SearchError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| SearchError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Route table, shared between the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/terms/search", web::get().to(search_handler))
        .route("/health", web::get().to(health_handler));
}

/// Client identity used as the rate-limit key
fn client_identity(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Search endpoint handler
async fn search_handler(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> ActixResult<HttpResponse> {
    let identity = client_identity(&req);

    // Budgets are checked before the query executes
    let verdict = app_state
        .global_limiter
        .check(&identity)
        .and_then(|_| app_state.search_limiter.check(&identity));

    if let Err(SearchError::Throttled {
        retry_after_seconds,
        ..
    }) = verdict
    {
        return Ok(HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after_seconds.to_string()))
            .json(serde_json::json!({
                "error": "Too many requests",
                "retry_after_seconds": retry_after_seconds,
            })));
    }

    match app_state.service.search(&params.q).await {
        Ok(results) => Ok(HttpResponse::Ok().json(results)),
        Err(e) => {
            tracing::error!(category = e.category(), "Search error: {}", e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Search failed",
            })))
        }
    }
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let status = match app_state.service.health_check().await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            "unhealthy"
        }
    };

    let response = serde_json::json!({
        "status": status,
        "terms": app_state.service.store().len(),
    });

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rate_limit::RateLimiter;
    use crate::service::SearchService;
    use crate::store::TermStore;
    use crate::Term;
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    async fn test_state(search_limit: u32) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = dir.path().join("terms.db");
        config.rate_limit.search_limit = search_limit;
        // An OS-assigned port keeps parallel tests from colliding
        config.server.port = 0;

        let store = Arc::new(TermStore::open(config.storage.clone()).await.unwrap());
        store
            .insert_terms(&[
                Term {
                    id: 1,
                    term: "Abacus".to_string(),
                    definition: "a counting frame".to_string(),
                },
                Term {
                    id: 2,
                    term: "abandon".to_string(),
                    definition: "to give up completely".to_string(),
                },
            ])
            .await
            .unwrap();

        let service = Arc::new(SearchService::new(config.search.clone(), store));
        let state = AppState {
            global_limiter: Arc::new(RateLimiter::new(
                "global",
                config.rate_limit.global_limit,
                config.rate_limit.window(),
            )),
            search_limiter: Arc::new(RateLimiter::new(
                "search",
                config.rate_limit.search_limit,
                config.rate_limit.window(),
            )),
            config: Arc::new(config),
            service,
        };
        (state, dir)
    }

    #[actix_web::test]
    async fn test_search_returns_ordered_terms() {
        let (state, _dir) = test_state(20).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/terms/search?q=ab")
            .to_request();
        let terms: Vec<Term> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "Abacus");
        assert_eq!(terms[1].term, "abandon");
    }

    #[actix_web::test]
    async fn test_short_query_yields_empty_array() {
        let (state, _dir) = test_state(20).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/terms/search?q=a")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Vec<Term> = test::read_body_json(resp).await;
        assert!(body.is_empty());
    }

    #[actix_web::test]
    async fn test_missing_query_param_defaults_to_empty() {
        let (state, _dir) = test_state(20).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/terms/search").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_search_budget_rejects_excess_requests() {
        let (state, _dir) = test_state(2).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/terms/search?q=ab")
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/terms/search?q=ab")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("Retry-After"));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Too many requests");
    }

    #[actix_web::test]
    async fn test_run_future_moves_onto_a_spawned_task() {
        let (state, _dir) = test_state(20).await;
        let server = ApiServer::new(state);

        // tokio::spawn requires the run future to be Send; the driver
        // relies on that to supervise the server from the shutdown select
        let handle = tokio::spawn(server.run());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[actix_web::test]
    async fn test_health_reports_term_count() {
        let (state, _dir) = test_state(20).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["terms"], 2);
    }
}

//! # Edge Proxy Module
//!
//! ## Purpose
//! Same-origin request handler that revalidates queries and forwards them
//! to the backend search service, normalizing backend failures into
//! client-safe responses.
//!
//! ## Input/Output Specification
//! - **Input**: `GET /api/search?q=<string>` from the client tier
//! - **Output**: `200` JSON array on success, `400` for overlong queries,
//!   `500` when the backend address is not configured, `502` for any
//!   backend failure
//! - **Forwarding**: `GET <backend-base>/terms/search?q=` with
//!   `Accept: application/json`, no caching
//!
//! ## Key Features
//! - Re-validates query length even though the client already did — the
//!   client tier is a boundary already crossed
//! - Fails closed when the backend base URL is absent; no outbound call is
//!   attempted
//! - An empty query answers with an empty list, distinguishing "nothing
//!   asked" from "nothing found"
//! - Backend stack traces and internal messages never reach the client

use crate::config::Config;
use crate::errors::{Result, SearchError};
use crate::query;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for edge request handlers
#[derive(Clone)]
pub struct EdgeState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

/// Edge proxy server
pub struct EdgeServer {
    state: EdgeState,
}

/// Incoming query parameters
#[derive(Debug, Deserialize)]
struct QueryParams {
    #[serde(default)]
    q: String,
}

impl EdgeServer {
    /// Create a new edge server with a forwarding HTTP client
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.edge.forward_timeout_seconds))
            .build()
            .map_err(|e| SearchError::Internal {
                message: format!("Failed to build forwarding client: {}", e),
            })?;

        Ok(Self {
            state: EdgeState { config, http },
        })
    }

    /// Run the edge server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.state.config.edge.host, self.state.config.edge.port
        );

        tracing::info!("Starting edge proxy on {}", bind_addr);

        let state = self.state.clone();
        // The builder is dropped here so only the Send `Server` handle is
        // held across the await; `run()` stays spawnable on the runtime.
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure)
        })
        .bind(&bind_addr)
        .map_err(|e| SearchError::Internal {
            message: format!("Failed to bind edge proxy to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| SearchError::Internal {
            message: format!("Edge proxy error: {}", e),
        })?;

        Ok(())
    }
}

/// Route table, shared between the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/search", web::get().to(search_proxy_handler));
}

fn json_no_store(status: actix_web::http::StatusCode, body: serde_json::Value) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Cache-Control", "no-store"))
        .json(body)
}

/// Same-origin search handler forwarding to the backend
async fn search_proxy_handler(
    state: web::Data<EdgeState>,
    params: web::Query<QueryParams>,
) -> ActixResult<HttpResponse> {
    use actix_web::http::StatusCode;

    let q = query::sanitize(&params.q);

    if q.is_empty() {
        // Nothing asked; not an error and not a backend call
        return Ok(json_no_store(StatusCode::OK, serde_json::json!([])));
    }

    if let Err(e) = query::validate_forwardable(&q) {
        tracing::debug!(len = q.len(), "Rejected overlong query: {}", e);
        return Ok(json_no_store(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "Query too long" }),
        ));
    }

    let base_url = match state.config.require_backend_base_url() {
        Ok(url) => url.trim_end_matches('/').to_string(),
        Err(e) => {
            tracing::error!("Edge misconfiguration: {}", e);
            return Ok(json_no_store(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Search backend is not configured" }),
            ));
        }
    };

    let response = state
        .http
        .get(format!("{}/terms/search", base_url))
        .query(&[("q", q.as_str())])
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await;

    let response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::warn!(status = %r.status(), "Backend returned non-success");
            return Ok(json_no_store(
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Backend error" }),
            ));
        }
        Err(e) => {
            tracing::warn!("Backend request failed: {}", e);
            return Ok(json_no_store(
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Backend error" }),
            ));
        }
    };

    match response.json::<serde_json::Value>().await {
        Ok(body) => Ok(json_no_store(StatusCode::OK, body)),
        Err(e) => {
            tracing::warn!("Backend returned unparseable body: {}", e);
            Ok(json_no_store(
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Backend error" }),
            ))
        }
    }
}

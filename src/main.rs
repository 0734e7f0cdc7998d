//! # Glossary Search Server Driver
//!
//! ## Purpose
//! Main entry point for the glossary search pipeline. Runs either tier of
//! the deployment: the backend API (rate limiter + search service + term
//! store) or the edge proxy in front of it.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Backend role: open the term store, optionally seed it, start the API
//! 4. Edge role: validate the backend address up front, start the proxy
//! 5. Handle shutdown signals gracefully

use clap::{value_parser, Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use glossary_search::{
    api::ApiServer,
    config::Config,
    edge::EdgeServer,
    errors::{Result, SearchError},
    rate_limit::RateLimiter,
    service::SearchService,
    store::TermStore,
    AppState, Term,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("glossary-server")
        .version("0.1.0")
        .author("Glossary Search Team")
        .about("Incremental glossary search pipeline: backend API and edge proxy")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("role")
                .short('r')
                .long("role")
                .value_name("ROLE")
                .help("Tier to run: backend API or edge proxy")
                .value_parser(["backend", "edge"])
                .default_value("backend"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Override the bind port of the selected role")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("FILE")
                .help("JSON term file loaded into the store on startup (backend role)"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").expect("has default");
    let mut config = Config::from_file(config_path)?;

    let role = matches.get_one::<String>("role").expect("has default");
    if let Some(port) = matches.get_one::<u16>("port") {
        match role.as_str() {
            "edge" => config.edge.port = *port,
            _ => config.server.port = *port,
        }
    }

    let config = Arc::new(config);

    init_logging(&config)?;
    info!("Starting glossary-server ({} role)", role);
    info!("Configuration loaded from: {}", config_path);

    match role.as_str() {
        "edge" => run_edge(config).await,
        _ => run_backend(config, matches.get_one::<String>("seed")).await,
    }
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config.logging.level.parse().map_err(|_| SearchError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    }

    Ok(())
}

/// Run the backend tier: term store, search service, rate limiters, API
async fn run_backend(config: Arc<Config>, seed: Option<&String>) -> Result<()> {
    info!("Initializing term store...");
    let store = Arc::new(TermStore::open(config.storage.clone()).await?);

    if let Some(seed_path) = seed {
        let count = load_seed_file(&store, seed_path).await?;
        info!("Seeded {} terms from {}", count, seed_path);
    }

    if store.is_empty() {
        warn!("Term store is empty; every search will come back empty");
    }

    store.health_check().await?;
    info!("✓ Term store is healthy ({} terms)", store.len());

    let service = Arc::new(SearchService::new(config.search.clone(), store));

    let app_state = AppState {
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
        service,
        config: config.clone(),
    };

    let server = ApiServer::new(app_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Backend server error: {}", e);
        }
    });

    info!(
        "Backend API started on {}:{}",
        config.server.host, config.server.port
    );

    wait_for_shutdown(server_handle).await;
    Ok(())
}

/// Run the edge tier: same-origin proxy in front of the backend
async fn run_edge(config: Arc<Config>) -> Result<()> {
    // Configuration absence is a hard error; catch it at startup rather
    // than on the first request
    let backend = config.require_backend_base_url()?;
    info!("Edge proxy forwarding to {}", backend);

    let server = EdgeServer::new(config.clone())?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Edge proxy error: {}", e);
        }
    });

    info!(
        "Edge proxy started on {}:{}",
        config.edge.host, config.edge.port
    );

    wait_for_shutdown(server_handle).await;
    Ok(())
}

/// Load a JSON array of terms into the store
async fn load_seed_file(store: &TermStore, path: &str) -> Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SearchError::Config {
            message: format!("Failed to read seed file {}: {}", path, e),
        })?;

    let terms: Vec<Term> = serde_json::from_str(&content)?;
    store.insert_terms(&terms).await
}

/// Block until SIGINT or until the server task stops on its own
async fn wait_for_shutdown(server_handle: tokio::task::JoinHandle<()>) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    info!("glossary-server shut down");
}

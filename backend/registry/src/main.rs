//! Subsidy registry — entry point.
//!
//! Serves the off-chain directory of governments, producers, oracles and
//! registered subsidy contracts over an Axum REST API, while a background
//! indexer polls Soroban `getEvents` for every registered contract and
//! persists the decoded events to SQLite.

mod api;
mod config;
mod db;
mod directory;
mod errors;
mod events;
mod indexer;
mod registry;
mod rpc;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    for address in &config.government_addresses {
        directory::validate_address(address)?;
        db::ensure_government(&pool, address).await?;
    }

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let shutdown = CancellationToken::new();

    // ─── Background indexer ───────────────────────────────
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    let indexer = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState { pool });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/auth/login", post(api::login))
        .route("/address-to-name", get(api::address_to_name))
        .route(
            "/government/producers",
            get(api::list_producers).post(api::add_producer),
        )
        .route(
            "/government/oracles",
            get(api::list_oracles).post(api::add_oracle),
        )
        .route("/government/subsidies", post(api::register_subsidy))
        .route("/subsidies", get(api::list_subsidies))
        .route("/producers/subsidies", get(api::list_producer_subsidies))
        .route("/subsidy-name", get(api::subsidy_name))
        .route("/subsidies/:contract/events", get(api::get_contract_events))
        .route("/events", get(api::get_all_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    indexer.await?;
    Ok(())
}

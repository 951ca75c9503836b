mod config;
mod fund;
mod ops;
mod secrets;

use anyhow::{Context, anyhow};
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use gc_api_types::ErrorResponse;
use gc_chain_evm::{EvmAdapter, EvmConfig};
use gc_claim_core::{CustodialFunder, Funder};
use gc_storage::RocksDbStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ServiceConfig;
use crate::secrets::SecretProvider;

const SERVICE_NAME: &str = "funding-service";

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
struct AppState {
    funder: Arc<dyn Funder>,
    store: Arc<RocksDbStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let evm_config = EvmConfig::from_env()?;

    let provider = secrets::provider_from_env()?;
    let sender = provider.sender_wallet()?;
    info!("custodial sender key loaded from {}", provider.source());

    let chain = Arc::new(EvmAdapter::new(evm_config));
    let funder = CustodialFunder::new(
        chain.clone(),
        Arc::new(sender),
        config.policy.clone(),
        config.token_uri.clone(),
    );
    info!(
        "funding from {} via {} (buffer {} wei, margin {}%)",
        funder.sender_address(),
        chain.config().rpc_url,
        config.policy.buffer_wei,
        config.policy.gas_margin_pct
    );

    let store = RocksDbStore::open_default(&config.db_path)?;
    info!("funding audit store at {}", config.db_path);

    let state = AppState {
        funder: Arc::new(funder),
        store: Arc::new(store),
    };
    let app = build_router(state);

    match &config.tls {
        Some(tls) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .context("failed to load TLS certificate or key")?;

            info!("{} listening on https://{}", SERVICE_NAME, config.bind_addr);
            axum_server::bind_rustls(config.bind_addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("{} listening on http://{}", SERVICE_NAME, config.bind_addr);
            let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/fund", post(fund::fund_wallet))
        .route("/ops/funding-events", get(ops::list_funding_events))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: SERVICE_NAME,
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn bad_gateway(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_GATEWAY, Json(ErrorResponse { error: message }))
}

fn conflict(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::CONFLICT, Json(ErrorResponse { error: message }))
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn epoch_ms() -> anyhow::Result<u128> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis())
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use logdash_core::error::{DashError, Result};
use logdash_warehouse::LogSource;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::client::GatewayClient;
use crate::{gateway, page};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn LogSource>,
    pub gateway: GatewayClient,
    pub project_id: String,
}

impl AppState {
    pub fn new(source: Arc<dyn LogSource>, gateway_url: String, project_id: String) -> Self {
        Self {
            source,
            gateway: GatewayClient::new(gateway_url),
            project_id,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);
    let api = Router::new()
        .route("/api/logs", get(gateway::get_logs))
        .route("/health", get(gateway::health))
        .layer(cors);

    Router::new()
        .route("/", get(page::dashboard))
        .merge(api)
        .layer(
            TraceLayer::new_for_http()
                .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DashError::Io(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "dashboard listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| DashError::Io(format!("HTTP server failed: {e}")))
}

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use logdash_core::model::response::{ErrorResponse, HealthResponse, LogsResponse};
use logdash_warehouse::fetch_recent_logs;

use crate::server::AppState;

pub async fn get_logs(State(state): State<AppState>) -> Response {
    match fetch_recent_logs(state.source.as_ref()).await {
        Ok(logs) => {
            tracing::info!(rows = logs.len(), "served recent logs");
            (
                [(CACHE_CONTROL, "no-store")],
                Json(LogsResponse::new(logs, Utc::now())),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "error fetching logs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CACHE_CONTROL, "no-store")],
                Json(ErrorResponse::fetch_failed(err.to_string())),
            )
                .into_response()
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

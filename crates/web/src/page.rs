use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use logdash_core::error::DashError;
use serde::Deserialize;

use crate::render::{render_dashboard, render_error};
use crate::server::AppState;
use crate::view::{DashboardView, TableState};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub expanded: Option<String>,
}

/// Renders the dashboard from one fresh gateway fetch.
pub async fn dashboard(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    match state.gateway.fetch_logs().await {
        Ok(resp) => {
            let view = DashboardView::build(&state.project_id, &resp, Utc::now());
            let table = TableState::new(params.expanded);
            (
                [(CACHE_CONTROL, "no-store")],
                Html(render_dashboard(&view, &table)),
            )
                .into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, gateway = state.gateway.url(), "dashboard render failed");
            let message = match err {
                DashError::UpstreamUnavailable(details) => details,
                other => other.to_string(),
            };
            (
                StatusCode::BAD_GATEWAY,
                [(CACHE_CONTROL, "no-store")],
                Html(render_error(&message)),
            )
                .into_response()
        }
    }
}

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use logdash_web::{AppState, router};
use serde_json::Value;
use testkit::{StaticSource, sample_logs};
use tower::ServiceExt;

fn app(source: StaticSource) -> axum::Router {
    let state = AppState::new(
        Arc::new(source),
        "http://127.0.0.1:9/api/logs".to_string(),
        "public-demo".to_string(),
    );
    router(state)
}

async fn get(app: axum::Router, uri: &str) -> anyhow::Result<(StatusCode, axum::http::HeaderMap, Value)> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, headers, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn logs_endpoint_returns_rows_and_refresh_time() -> anyhow::Result<()> {
    let (status, headers, body) = get(app(StaticSource::new(sample_logs())), "/api/logs").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");

    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["insert_id"], "insert-error-1");
    assert_eq!(logs[0]["timestamp"]["value"], "2026-02-01T00:00:01.200+00:00");
    assert_eq!(logs[1]["text_payload"], Value::Null);
    assert_eq!(logs[1]["http_request"], "null");
    assert!(body["lastUpdated"].as_str().unwrap().ends_with('Z'));
    Ok(())
}

#[tokio::test]
async fn logs_endpoint_caps_rows() -> anyhow::Result<()> {
    let template = sample_logs().remove(0);
    let rows = (0..150)
        .map(|i| {
            let mut row = template.clone();
            row.insert_id = format!("row-{i}");
            row
        })
        .collect();
    let (status, _, body) = get(app(StaticSource::new(rows)), "/api/logs").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"].as_array().unwrap().len(), 100);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_is_a_500_with_details() -> anyhow::Result<()> {
    let source = StaticSource::failing("dataset logger-462111:logging not found");
    let (status, headers, body) = get(app(source), "/api/logs").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    assert_eq!(body["error"], "Failed to fetch logs");
    assert!(
        body["details"]
            .as_str()
            .unwrap()
            .contains("dataset logger-462111:logging not found")
    );
    assert!(body.get("logs").is_none());
    Ok(())
}

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    let (status, _, body) = get(app(StaticSource::new(Vec::new())), "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn api_allows_cross_origin_reads() -> anyhow::Result<()> {
    let response = app(StaticSource::new(Vec::new()))
        .oneshot(
            Request::builder()
                .uri("/api/logs")
                .header("origin", "http://example.test")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    Ok(())
}

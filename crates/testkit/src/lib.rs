pub mod bigquery;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use logdash_core::error::{DashError, Result};
use logdash_core::model::log::{LogEntry, TimestampValue};
use logdash_warehouse::LogSource;

/// Two rows, newest first: an ERROR with a text payload and an INFO carrying JSON.
pub fn sample_logs() -> Vec<LogEntry> {
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    vec![
        LogEntry {
            timestamp: TimestampValue::new((base + Duration::milliseconds(1200)).to_rfc3339()),
            severity: "ERROR".to_string(),
            log_name: "projects/logger-462111/logs/run.googleapis.com%2Fstderr".to_string(),
            text_payload: Some("context deadline exceeded".to_string()),
            json_payload: "null".to_string(),
            insert_id: "insert-error-1".to_string(),
            resource_type: "cloud_run_revision".to_string(),
            resource_labels: r#"{"service_name":"api","location":"us-central1"}"#.to_string(),
            http_request: r#"{"requestMethod":"GET","status":504}"#.to_string(),
            trace: Some("projects/logger-462111/traces/4bf92f3577b34da6a3ce929d0e0e4736".to_string()),
            span_id: Some("00f067aa0ba902b7".to_string()),
            source_location: "null".to_string(),
            labels: "{}".to_string(),
            service_name: "api".to_string(),
        },
        LogEntry {
            timestamp: TimestampValue::new((base + Duration::milliseconds(950)).to_rfc3339()),
            severity: "INFO".to_string(),
            log_name: "projects/logger-462111/logs/run.googleapis.com%2Fstdout".to_string(),
            text_payload: None,
            json_payload: r#"{"message":"retrying","attempt":2}"#.to_string(),
            insert_id: "insert-info-2".to_string(),
            resource_type: "cloud_run_revision".to_string(),
            resource_labels: r#"{"service_name":"api"}"#.to_string(),
            http_request: "null".to_string(),
            trace: None,
            span_id: None,
            source_location: r#"{"file":"main.go","line":"42"}"#.to_string(),
            labels: r#"{"instanceId":"0087"}"#.to_string(),
            service_name: "api".to_string(),
        },
    ]
}

/// In-memory source returning fixed rows, or failing the dataset check.
pub struct StaticSource {
    rows: Vec<LogEntry>,
    failure: Option<String>,
}

impl StaticSource {
    pub fn new(rows: Vec<LogEntry>) -> Self {
        Self {
            rows,
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            rows: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl LogSource for StaticSource {
    async fn check_dataset(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(DashError::UpstreamUnavailable(message.clone())),
            None => Ok(()),
        }
    }

    async fn query_recent(&self) -> Result<Vec<LogEntry>> {
        Ok(self.rows.clone())
    }
}

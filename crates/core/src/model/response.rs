use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::model::log::LogEntry;

/// Most rows the gateway ever returns.
pub const MAX_ROWS: usize = 100;

pub const FETCH_FAILED: &str = "Failed to fetch logs";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
    pub last_updated: String,
}

impl LogsResponse {
    pub fn new(logs: Vec<LogEntry>, now: DateTime<Utc>) -> Self {
        Self {
            logs,
            last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn fetch_failed(details: impl Into<String>) -> Self {
        Self {
            error: FETCH_FAILED.to_string(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

use std::collections::HashMap;

use logdash_core::error::{DashError, Result};
use logdash_core::model::log::{LogEntry, NULL_SENTINEL, TimestampValue};
use logdash_core::model::response::MAX_ROWS;
use logdash_core::time::{from_unix_micros, to_iso8601};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns selected by [`logs_query`], in order.
pub const COLUMNS: [&str; 14] = [
    "timestamp",
    "severity",
    "log_name",
    "text_payload",
    "json_payload",
    "insert_id",
    "resource_type",
    "resource_labels",
    "http_request",
    "trace",
    "span_id",
    "source_location",
    "labels",
    "service_name",
];

/// The one statement the gateway runs. `table` is `project.dataset.table`.
pub fn logs_query(table: &str) -> String {
    format!(
        r#"
SELECT
  timestamp,
  severity,
  log_name,
  COALESCE(text_payload, '') AS text_payload,
  COALESCE(TO_JSON_STRING(json_payload), 'null') AS json_payload,
  insert_id,
  resource_type,
  COALESCE(TO_JSON_STRING(resource_labels), 'null') AS resource_labels,
  COALESCE(TO_JSON_STRING(http_request), 'null') AS http_request,
  trace,
  span_id,
  COALESCE(TO_JSON_STRING(source_location), 'null') AS source_location,
  COALESCE(TO_JSON_STRING(labels), 'null') AS labels,
  service_name
FROM `{table}`
ORDER BY timestamp DESC
LIMIT {MAX_ROWS}
"#
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub use_legacy_sql: bool,
    pub max_results: u32,
    pub format_options: FormatOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    pub use_int64_timestamp: bool,
}

impl QueryRequest {
    pub fn for_table(table: &str) -> Self {
        Self {
            query: logs_query(table),
            use_legacy_sql: false,
            max_results: MAX_ROWS as u32,
            format_options: FormatOptions {
                use_int64_timestamp: true,
            },
        }
    }
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    pub job_reference: Option<JobReference>,
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: Value,
}

/// Turns `f`/`v` rows into entries by column name.
pub fn decode_rows(schema: &TableSchema, rows: &[TableRow]) -> Result<Vec<LogEntry>> {
    let index: HashMap<&str, usize> = schema
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.as_str(), i))
        .collect();

    if !index.contains_key("timestamp") {
        return Err(DashError::UpstreamUnavailable(
            "query result is missing the timestamp column".to_string(),
        ));
    }

    Ok(rows
        .iter()
        .take(MAX_ROWS)
        .map(|row| decode_row(&index, row))
        .collect())
}

fn decode_row(index: &HashMap<&str, usize>, row: &TableRow) -> LogEntry {
    let cell = |name: &str| -> Option<String> {
        let pos = *index.get(name)?;
        match &row.f.get(pos)?.v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    };
    let json_text = |name: &str| cell(name).unwrap_or_else(|| NULL_SENTINEL.to_string());

    LogEntry {
        timestamp: TimestampValue::new(decode_timestamp(cell("timestamp").as_deref())),
        severity: cell("severity").unwrap_or_default(),
        log_name: cell("log_name").unwrap_or_default(),
        text_payload: cell("text_payload").filter(|t| !t.is_empty()),
        json_payload: json_text("json_payload"),
        insert_id: cell("insert_id").unwrap_or_default(),
        resource_type: cell("resource_type").unwrap_or_default(),
        resource_labels: json_text("resource_labels"),
        http_request: json_text("http_request"),
        trace: cell("trace").filter(|t| !t.is_empty()),
        span_id: cell("span_id").filter(|s| !s.is_empty()),
        source_location: json_text("source_location"),
        labels: json_text("labels"),
        service_name: cell("service_name").unwrap_or_default(),
    }
}

/// TIMESTAMP cells arrive as integer microseconds, or float seconds when the
/// int64 format option is ignored. Anything else passes through as-is.
fn decode_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    if let Ok(micros) = raw.parse::<i64>()
        && let Some(ts) = from_unix_micros(micros)
    {
        return to_iso8601(ts);
    }

    if let Ok(seconds) = raw.parse::<f64>()
        && seconds.is_finite()
        && let Some(ts) = from_unix_micros((seconds * 1_000_000.0).round() as i64)
    {
        return to_iso8601(ts);
    }

    raw.to_string()
}

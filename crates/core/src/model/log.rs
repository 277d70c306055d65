use serde::{Deserialize, Serialize};

/// Literal stored by the warehouse query when a structured column is absent.
pub const NULL_SENTINEL: &str = "null";
/// Literal stored for an empty label map.
pub const EMPTY_OBJECT_SENTINEL: &str = "{}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimestampValue {
    pub value: String,
}

impl TimestampValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// One row of the log table, as returned by the gateway.
///
/// Structured columns (`json_payload`, `resource_labels`, `http_request`,
/// `source_location`, `labels`) hold JSON text and use [`NULL_SENTINEL`] or
/// [`EMPTY_OBJECT_SENTINEL`] when they carry nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: TimestampValue,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub log_name: String,
    #[serde(default)]
    pub text_payload: Option<String>,
    #[serde(default = "null_sentinel")]
    pub json_payload: String,
    #[serde(default)]
    pub insert_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default = "null_sentinel")]
    pub resource_labels: String,
    #[serde(default = "null_sentinel")]
    pub http_request: String,
    #[serde(default)]
    pub trace: Option<String>,
    #[serde(default)]
    pub span_id: Option<String>,
    #[serde(default = "null_sentinel")]
    pub source_location: String,
    #[serde(default = "empty_object_sentinel")]
    pub labels: String,
    #[serde(default)]
    pub service_name: String,
}

fn null_sentinel() -> String {
    NULL_SENTINEL.to_string()
}

fn empty_object_sentinel() -> String {
    EMPTY_OBJECT_SENTINEL.to_string()
}

/// True when a JSON-text field carries no structured data.
pub fn is_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == NULL_SENTINEL || trimmed == EMPTY_OBJECT_SENTINEL
}

impl LogEntry {
    /// Text payload, treating an empty string as absent.
    pub fn text(&self) -> Option<&str> {
        self.text_payload.as_deref().filter(|t| !t.is_empty())
    }

    pub fn has_json_payload(&self) -> bool {
        !is_sentinel(&self.json_payload)
    }

    /// Short message shown in the table row.
    pub fn message_summary(&self) -> &str {
        match self.text() {
            Some(text) => text,
            None if self.has_json_payload() => "JSON Data",
            None => "No message",
        }
    }

    /// Project segment of `projects/<project>/logs/<name>`.
    pub fn project_label(&self) -> Option<&str> {
        self.log_name
            .split('/')
            .nth(1)
            .filter(|segment| !segment.is_empty())
    }
}

//! View model for the dashboard table: everything the renderer needs, already
//! formatted, plus the single-open expansion state.

use chrono::{DateTime, Utc};
use logdash_core::model::log::{LogEntry, is_sentinel};
use logdash_core::model::response::LogsResponse;
use logdash_core::severity::badge_color;
use logdash_core::time::{distance_to_now, format_timestamp, parse_timestamp};

const SUMMARY_MAX_CHARS: usize = 120;
const NOT_AVAILABLE: &str = "N/A";

/// Which row's detail panel is open. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    expanded: Option<String>,
}

impl TableState {
    /// An empty id is a valid selection; rows may carry no insert id.
    pub fn new(expanded: Option<String>) -> Self {
        Self { expanded }
    }

    /// Opens `id`, or closes it when it is already the open row.
    pub fn toggle(&mut self, id: &str) {
        if self.is_expanded(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.to_string());
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.as_deref() == Some(id)
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub title: &'static str,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    pub basic: Vec<(&'static str, String)>,
    pub text_payload: Option<String>,
    pub sections: Vec<DetailSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub timestamp: String,
    pub severity: String,
    pub badge_class: &'static str,
    pub service: String,
    pub resource_type: String,
    pub summary: String,
    pub detail: DetailPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub project_id: String,
    pub project_label: String,
    pub last_updated: String,
    pub rows: Vec<RowView>,
}

impl DashboardView {
    pub fn build(project_id: &str, resp: &LogsResponse, now: DateTime<Utc>) -> Self {
        let last_updated = match parse_timestamp(&resp.last_updated) {
            Ok(ts) => format!("{} ago", distance_to_now(ts, now)),
            Err(_) => resp.last_updated.clone(),
        };

        Self {
            project_id: project_id.to_string(),
            project_label: resp
                .logs
                .first()
                .and_then(LogEntry::project_label)
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            last_updated,
            rows: resp.logs.iter().map(RowView::from_entry).collect(),
        }
    }
}

impl RowView {
    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            id: entry.insert_id.clone(),
            timestamp: format_timestamp(&entry.timestamp.value),
            severity: entry.severity.clone(),
            badge_class: badge_color(&entry.severity).css_class(),
            service: entry.service_name.clone(),
            resource_type: entry.resource_type.clone(),
            summary: truncate_chars(entry.message_summary(), SUMMARY_MAX_CHARS),
            detail: DetailPanel::from_entry(entry),
        }
    }
}

impl DetailPanel {
    pub fn from_entry(entry: &LogEntry) -> Self {
        let basic = vec![
            ("Insert ID", entry.insert_id.clone()),
            ("Log Name", entry.log_name.clone()),
            ("Trace", or_not_available(entry.trace.as_deref())),
            ("Span ID", or_not_available(entry.span_id.as_deref())),
        ];

        let sections = [
            ("Resource Labels", &entry.resource_labels),
            ("JSON Payload", &entry.json_payload),
            ("HTTP Request Details", &entry.http_request),
            ("Labels", &entry.labels),
            ("Source Location", &entry.source_location),
        ]
        .into_iter()
        .filter(|(_, raw)| !is_sentinel(raw))
        .map(|(title, raw)| DetailSection {
            title,
            body: pretty_json(raw),
        })
        .collect();

        Self {
            basic,
            text_payload: entry.text().map(str::to_string),
            sections,
        }
    }
}

fn or_not_available(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Indented JSON; text that is not JSON is shown as-is.
pub fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| raw.to_string())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use logdash_core::model::log::TimestampValue;

    use super::*;

    fn entry() -> LogEntry {
        serde_json::from_value(serde_json::json!({
            "timestamp": {"value": "2026-02-01T00:00:01.200Z"},
            "severity": "ERROR",
            "log_name": "projects/logger-462111/logs/stderr",
            "text_payload": "boom",
            "json_payload": "null",
            "insert_id": "id-1",
            "resource_type": "cloud_run_revision",
            "resource_labels": "{\"service_name\":\"api\"}",
            "http_request": "null",
            "source_location": "null",
            "labels": "{}",
            "service_name": "api"
        }))
        .unwrap()
    }

    #[test]
    fn toggle_opens_switches_and_closes() {
        let mut state = TableState::default();
        state.toggle("a");
        assert_eq!(state.expanded(), Some("a"));
        state.toggle("b");
        assert_eq!(state.expanded(), Some("b"));
        assert!(!state.is_expanded("a"));
        state.toggle("b");
        assert_eq!(state.expanded(), None);
    }

    #[test]
    fn row_without_insert_id_can_be_opened() {
        let mut state = TableState::default();
        state.toggle("");
        assert_eq!(state.expanded(), Some(""));
        assert!(TableState::new(Some(String::new())).is_expanded(""));
        state.toggle("");
        assert_eq!(state.expanded(), None);
    }

    #[test]
    fn sentinel_sections_are_omitted() {
        let panel = DetailPanel::from_entry(&entry());
        let titles: Vec<_> = panel.sections.iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Resource Labels"]);
        assert_eq!(panel.text_payload.as_deref(), Some("boom"));
        assert_eq!(panel.basic[2], ("Trace", "N/A".to_string()));
    }

    #[test]
    fn sections_are_pretty_printed() {
        let mut e = entry();
        e.labels = "{\"env\":\"prod\"}".to_string();
        let panel = DetailPanel::from_entry(&e);
        let labels = panel.sections.iter().find(|s| s.title == "Labels").unwrap();
        assert_eq!(labels.body, "{\n  \"env\": \"prod\"\n}");
    }

    #[test]
    fn non_json_section_is_shown_raw() {
        assert_eq!(pretty_json("not json {"), "not json {");
    }

    #[test]
    fn row_uses_badge_and_formatted_timestamp() {
        let row = RowView::from_entry(&entry());
        assert_eq!(row.badge_class, "badge-red");
        assert_eq!(row.timestamp, "Feb 01, 2026 00:00:01.200 UTC");
        assert_eq!(row.summary, "boom");

        let mut odd = entry();
        odd.timestamp = TimestampValue::new("not a time");
        odd.severity = "NOTICE".to_string();
        let row = RowView::from_entry(&odd);
        assert_eq!(row.timestamp, "not a time");
        assert_eq!(row.badge_class, "badge-gray");
    }

    #[test]
    fn long_messages_are_truncated() {
        let mut e = entry();
        e.text_payload = Some("x".repeat(500));
        let row = RowView::from_entry(&e);
        assert_eq!(row.summary.chars().count(), SUMMARY_MAX_CHARS + 1);
        assert!(row.summary.ends_with('…'));
        assert_eq!(row.detail.text_payload.unwrap().len(), 500);
    }

    #[test]
    fn header_fields() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 5, 0).unwrap();
        let resp = LogsResponse {
            logs: vec![entry()],
            last_updated: "2026-02-01T00:00:00.000Z".to_string(),
        };
        let view = DashboardView::build("public-demo", &resp, now);
        assert_eq!(view.project_label, "logger-462111");
        assert_eq!(view.last_updated, "5 minutes ago");

        let empty = LogsResponse {
            logs: Vec::new(),
            last_updated: "garbled".to_string(),
        };
        let view = DashboardView::build("public-demo", &empty, now);
        assert_eq!(view.project_label, "N/A");
        assert_eq!(view.last_updated, "garbled");
    }
}

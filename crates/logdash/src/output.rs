use logdash_core::model::log::LogEntry;
use logdash_core::model::response::LogsResponse;
use logdash_core::severity::{BadgeColor, badge_color};
use logdash_core::time::{distance_to_now, format_timestamp, parse_timestamp};
use owo_colors::OwoColorize;

pub fn print_logs_human(resp: &LogsResponse) {
    for entry in &resp.logs {
        println!("{}", format_entry(entry));
    }

    let updated = parse_timestamp(&resp.last_updated)
        .map(|ts| format!("{} ago", distance_to_now(ts, chrono::Utc::now())))
        .unwrap_or_else(|_| resp.last_updated.clone());
    println!("-- {} entries, updated {} --", resp.logs.len(), updated);
}

fn format_entry(entry: &LogEntry) -> String {
    let trace = entry.trace.as_deref().unwrap_or("-");
    format!(
        "{} {} {} {} trace={} | {}",
        format_timestamp(&entry.timestamp.value),
        severity_label(&entry.severity),
        entry.service_name.cyan(),
        entry.resource_type,
        trace,
        entry.message_summary()
    )
}

fn severity_label(severity: &str) -> String {
    let label = if severity.is_empty() { "-" } else { severity };
    match badge_color(severity) {
        BadgeColor::Red => label.red().to_string(),
        BadgeColor::Yellow => label.yellow().to_string(),
        BadgeColor::Blue => label.blue().to_string(),
        BadgeColor::Gray => label.bright_black().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_line_carries_summary_and_trace() {
        let entry: LogEntry = serde_json::from_value(serde_json::json!({
            "timestamp": {"value": "2026-02-01T00:00:01.200Z"},
            "severity": "INFO",
            "json_payload": "{\"k\":1}",
            "insert_id": "i",
            "resource_type": "cloud_run_revision",
            "service_name": "api"
        }))
        .unwrap();
        let line = format_entry(&entry);
        assert!(line.starts_with("Feb 01, 2026 00:00:01.200 UTC"));
        assert!(line.contains("trace=-"));
        assert!(line.ends_with("| JSON Data"));
    }

    #[test]
    fn severity_keeps_its_text() {
        assert!(severity_label("ERROR").contains("ERROR"));
        assert!(severity_label("").contains('-'));
    }
}

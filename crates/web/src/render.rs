//! Server-side HTML for the dashboard and its error screen.

use url::form_urlencoded;

use crate::view::{DashboardView, DetailPanel, RowView, TableState};

pub const PAGE_TITLE: &str = "Log Anomaly Detection Dashboard";

pub fn render_dashboard(view: &DashboardView, state: &TableState) -> String {
    let mut html = String::with_capacity(16 * 1024);
    push_head(&mut html);

    html.push_str("<main>\n<div class=\"hero\">\n");
    html.push_str(&format!("<h1>{PAGE_TITLE}</h1>\n"));
    html.push_str(&format!(
        "<p class=\"subtitle\">Project ID: {}</p>\n",
        html_escape(&view.project_id)
    ));
    html.push_str("</div>\n");

    html.push_str("<section class=\"card\">\n<div class=\"card-header\">\n");
    html.push_str(&format!(
        "<h2>Recent Logs <span class=\"project\">{}</span></h2>\n",
        html_escape(&view.project_label)
    ));
    html.push_str(&format!(
        "<p class=\"meta\"><span>Last updated: {}</span> <span>Showing {} entries</span></p>\n",
        html_escape(&view.last_updated),
        view.rows.len()
    ));
    html.push_str("</div>\n");

    html.push_str("<table class=\"logs\">\n<thead>\n<tr>");
    for col in ["Timestamp", "Severity", "Service", "Resource Type", "Message", ""] {
        html.push_str(&format!("<th>{col}</th>"));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    // Duplicate insert ids would otherwise open more than one panel.
    let mut opened = false;
    for (idx, row) in view.rows.iter().enumerate() {
        let open = !opened && state.is_expanded(&row.id);
        opened |= open;
        push_row(&mut html, idx, row, open, state);
    }
    html.push_str("</tbody>\n</table>\n</section>\n</main>\n");

    html.push_str("<script>\n");
    html.push_str(TOGGLE_SCRIPT);
    html.push_str("</script>\n");
    html.push_str("</body>\n</html>\n");
    html
}

pub fn render_error(message: &str) -> String {
    let mut html = String::with_capacity(2048);
    push_head(&mut html);
    html.push_str("<main>\n<div class=\"error-screen\">\n");
    html.push_str("<h1>Error Loading Logs</h1>\n");
    html.push_str(&format!(
        "<p class=\"error-message\">{}</p>\n",
        html_escape(message)
    ));
    html.push_str("<p class=\"hint\">Please check your BigQuery connection and try again.</p>\n");
    html.push_str("</div>\n</main>\n</body>\n</html>\n");
    html
}

fn push_head(html: &mut String) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{PAGE_TITLE}</title>\n"));
    html.push_str("<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
}

fn push_row(html: &mut String, idx: usize, row: &RowView, open: bool, state: &TableState) {
    let mut next = state.clone();
    next.toggle(&row.id);
    let href = toggle_href(next.expanded());

    html.push_str(&format!(
        "<tr class=\"log-row\" data-row=\"{idx}\" data-id=\"{}\">",
        html_escape(&row.id)
    ));
    html.push_str(&format!(
        "<td class=\"ts\">{}</td>",
        html_escape(&row.timestamp)
    ));
    html.push_str(&format!(
        "<td><span class=\"badge {}\">{}</span></td>",
        row.badge_class,
        html_escape(&row.severity)
    ));
    html.push_str(&format!("<td>{}</td>", html_escape(&row.service)));
    html.push_str(&format!("<td>{}</td>", html_escape(&row.resource_type)));
    html.push_str(&format!(
        "<td class=\"summary\" title=\"{}\">{}</td>",
        html_escape(&row.summary),
        html_escape(&row.summary)
    ));
    html.push_str(&format!(
        "<td><a class=\"toggle\" data-row=\"{idx}\" href=\"{}\">{}</a></td>",
        html_escape(&href),
        if open { "Hide Details" } else { "Show Details" }
    ));
    html.push_str("</tr>\n");

    html.push_str(&format!(
        "<tr class=\"detail-row\" data-detail=\"{idx}\"{}>",
        if open { "" } else { " hidden" }
    ));
    html.push_str("<td colspan=\"6\">\n");
    push_detail(html, &row.detail);
    html.push_str("</td></tr>\n");
}

fn push_detail(html: &mut String, detail: &DetailPanel) {
    html.push_str("<div class=\"detail\">\n");
    html.push_str("<h3>Basic Information</h3>\n<dl>\n");
    for (label, value) in &detail.basic {
        html.push_str(&format!(
            "<dt>{label}</dt><dd>{}</dd>\n",
            html_escape(value)
        ));
    }
    html.push_str("</dl>\n");

    if let Some(text) = &detail.text_payload {
        html.push_str("<h3>Text Payload</h3>\n");
        html.push_str(&format!("<pre>{}</pre>\n", html_escape(text)));
    }

    for section in &detail.sections {
        html.push_str(&format!("<h3>{}</h3>\n", section.title));
        html.push_str(&format!("<pre>{}</pre>\n", html_escape(&section.body)));
    }
    html.push_str("</div>\n");
}

fn toggle_href(expanded: Option<&str>) -> String {
    match expanded {
        Some(id) => format!(
            "?expanded={}",
            form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>()
        ),
        None => "?".to_string(),
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #f9fafb; color: #111827; }
main { max-width: 1280px; margin: 0 auto; padding: 2rem 1rem; }
.hero h1 { font-size: 1.875rem; margin: 0 0 .25rem; }
.subtitle { color: #6b7280; margin: 0 0 1.5rem; }
.card { background: #fff; border-radius: .5rem; box-shadow: 0 1px 3px rgba(0,0,0,.1); overflow: hidden; }
.card-header { padding: 1rem 1.5rem; border-bottom: 1px solid #e5e7eb; }
.card-header h2 { font-size: 1.125rem; margin: 0; }
.project { color: #6b7280; font-weight: normal; font-size: .875rem; margin-left: .5rem; }
.meta { color: #6b7280; font-size: .875rem; margin: .25rem 0 0; display: flex; justify-content: space-between; }
table.logs { width: 100%; border-collapse: collapse; font-size: .875rem; }
table.logs th { text-align: left; padding: .75rem 1.5rem; background: #f9fafb; color: #6b7280; text-transform: uppercase; font-size: .75rem; }
table.logs td { padding: .75rem 1.5rem; border-top: 1px solid #e5e7eb; vertical-align: top; }
.log-row { cursor: pointer; }
.log-row:hover { background: #f9fafb; }
.ts { white-space: nowrap; }
.summary { max-width: 28rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.badge { display: inline-block; padding: .125rem .625rem; border-radius: 9999px; font-size: .75rem; font-weight: 600; }
.badge-red { background: #fee2e2; color: #991b1b; }
.badge-yellow { background: #fef3c7; color: #92400e; }
.badge-blue { background: #dbeafe; color: #1e40af; }
.badge-gray { background: #f3f4f6; color: #1f2937; }
.toggle { color: #2563eb; text-decoration: none; white-space: nowrap; }
.detail { background: #f9fafb; padding: 1rem; border-radius: .375rem; }
.detail h3 { font-size: .875rem; margin: 1rem 0 .5rem; }
.detail dl { display: grid; grid-template-columns: max-content 1fr; gap: .25rem 1rem; margin: 0; }
.detail dt { color: #6b7280; }
.detail dd { margin: 0; word-break: break-all; }
.detail pre { background: #fff; border: 1px solid #e5e7eb; padding: .75rem; overflow-x: auto; white-space: pre-wrap; }
.error-screen { max-width: 40rem; margin: 4rem auto; background: #fef2f2; border: 1px solid #fecaca; border-radius: .5rem; padding: 1.5rem; }
.error-screen h1 { color: #991b1b; font-size: 1.25rem; margin: 0 0 .5rem; }
.error-message { color: #b91c1c; }
.hint { color: #7f1d1d; font-size: .875rem; }
"#;

// Same single-open rule as TableState::toggle, applied without reloading.
const TOGGLE_SCRIPT: &str = r#"(function () {
  var open = null;
  document.querySelectorAll('tr.detail-row').forEach(function (row) {
    if (!row.hidden) { open = row.getAttribute('data-detail'); }
  });
  function setOpen(idx, isOpen) {
    var detail = document.querySelector('tr.detail-row[data-detail="' + idx + '"]');
    var link = document.querySelector('a.toggle[data-row="' + idx + '"]');
    if (detail) { detail.hidden = !isOpen; }
    if (link) { link.textContent = isOpen ? 'Hide Details' : 'Show Details'; }
  }
  function toggle(idx) {
    if (open === idx) {
      setOpen(idx, false);
      open = null;
    } else {
      if (open !== null) { setOpen(open, false); }
      setOpen(idx, true);
      open = idx;
    }
  }
  document.querySelectorAll('tr.log-row').forEach(function (row) {
    row.addEventListener('click', function () {
      toggle(row.getAttribute('data-row'));
    });
  });
  document.querySelectorAll('a.toggle').forEach(function (link) {
    link.addEventListener('click', function (ev) {
      ev.preventDefault();
      ev.stopPropagation();
      toggle(link.getAttribute('data-row'));
    });
  });
})();
"#;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use logdash_core::model::log::LogEntry;
    use logdash_core::model::response::LogsResponse;

    use super::*;

    fn entry(id: &str, text: &str) -> LogEntry {
        serde_json::from_value(serde_json::json!({
            "timestamp": {"value": "2026-02-01T00:00:01.200Z"},
            "severity": "WARNING",
            "log_name": "projects/logger-462111/logs/stdout",
            "text_payload": text,
            "insert_id": id,
            "resource_type": "cloud_run_revision",
            "service_name": "api"
        }))
        .unwrap()
    }

    fn view(logs: Vec<LogEntry>) -> DashboardView {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 20).unwrap();
        let resp = LogsResponse {
            logs,
            last_updated: "2026-02-01T00:00:00.000Z".to_string(),
        };
        DashboardView::build("public-demo", &resp, now)
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape("<a href=\"x\">&'"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn header_and_rows() {
        let html = render_dashboard(
            &view(vec![entry("a", "first"), entry("b", "second")]),
            &TableState::default(),
        );
        assert!(html.contains(PAGE_TITLE));
        assert!(html.contains("Project ID: public-demo"));
        assert!(html.contains("logger-462111"));
        assert!(html.contains("Last updated: less than a minute ago"));
        assert!(html.contains("Showing 2 entries"));
        assert!(html.contains("badge badge-yellow"));
        assert_eq!(html.matches("class=\"log-row\"").count(), 2);
        assert_eq!(html.matches(" hidden>").count(), 2);
        assert!(html.find("first").unwrap() < html.find("second").unwrap());
    }

    #[test]
    fn expanded_row_is_visible_and_links_toggle() {
        let html = render_dashboard(
            &view(vec![entry("a", "first"), entry("b", "second")]),
            &TableState::new(Some("b".to_string())),
        );
        assert!(html.contains("<tr class=\"detail-row\" data-detail=\"1\">"));
        assert!(html.contains("<tr class=\"detail-row\" data-detail=\"0\" hidden>"));
        assert_eq!(html.matches(">Hide Details<").count(), 1);
        // Clicking the open row closes it; clicking another switches.
        assert!(html.contains("data-row=\"1\" href=\"?\""));
        assert!(html.contains("data-row=\"0\" href=\"?expanded=a\""));
    }

    #[test]
    fn duplicate_ids_open_only_first() {
        let html = render_dashboard(
            &view(vec![entry("dup", "one"), entry("dup", "two")]),
            &TableState::new(Some("dup".to_string())),
        );
        assert_eq!(html.matches(" hidden>").count(), 1);
        assert!(html.contains("data-detail=\"0\">"));
    }

    #[test]
    fn payload_is_escaped() {
        let html = render_dashboard(
            &view(vec![entry("x", "<script>alert(1)</script>")]),
            &TableState::default(),
        );
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn ids_are_url_encoded() {
        assert_eq!(toggle_href(Some("a b/c&d")), "?expanded=a+b%2Fc%26d");
        assert_eq!(toggle_href(None), "?");
    }

    #[test]
    fn whole_row_toggles_its_panel() {
        let html = render_dashboard(&view(vec![entry("a", "first")]), &TableState::default());
        let script = &html[html.find("<script>").unwrap()..];
        assert!(script.contains("querySelectorAll('tr.log-row')"));
        assert!(script.contains("ev.stopPropagation()"));
        assert!(html.contains("<tr class=\"log-row\" data-row=\"0\""));
        assert!(html.contains(".log-row { cursor: pointer; }"));
    }

    #[test]
    fn row_without_insert_id_opens_from_its_link() {
        let rows = vec![entry("", "anonymous"), entry("b", "named")];
        let html = render_dashboard(&view(rows.clone()), &TableState::default());
        assert!(html.contains("data-row=\"0\" href=\"?expanded=\""));

        let html = render_dashboard(&view(rows), &TableState::new(Some(String::new())));
        assert!(html.contains("<tr class=\"detail-row\" data-detail=\"0\">"));
        assert!(html.contains("data-row=\"0\" href=\"?\">Hide Details"));
    }

    #[test]
    fn error_screen() {
        let html = render_error("dataset logger:logging not found");
        assert!(html.contains("Error Loading Logs"));
        assert!(html.contains("dataset logger:logging not found"));
        assert!(html.contains("Please check your BigQuery connection and try again."));
        assert!(!html.contains("<table"));
    }
}

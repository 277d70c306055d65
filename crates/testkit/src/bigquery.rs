//! Minimal stand-in for the BigQuery REST v2 endpoints the warehouse client calls.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::DateTime;
use logdash_core::model::log::LogEntry;
use serde_json::{Value, json};

pub const JOB_ID: &str = "job_logdash_test";

#[derive(Debug, Clone)]
pub struct MockOptions {
    pub rows: Vec<LogEntry>,
    pub dataset_exists: bool,
    pub token: String,
    /// First `jobs.query` answer reports the job as still running.
    pub defer_completion: bool,
    pub query_error: Option<(u16, String)>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dataset_exists: true,
            token: "test-token".to_string(),
            defer_completion: false,
            query_error: None,
        }
    }
}

#[derive(Clone)]
struct MockState {
    opts: Arc<MockOptions>,
    queries: Arc<Mutex<Vec<Value>>>,
}

pub struct MockBigQuery {
    pub addr: SocketAddr,
    queries: Arc<Mutex<Vec<Value>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockBigQuery {
    pub async fn start(opts: MockOptions) -> anyhow::Result<Self> {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            opts: Arc::new(opts),
            queries: queries.clone(),
        };
        let app = Router::new()
            .route(
                "/bigquery/v2/projects/{project}/datasets/{dataset}",
                get(get_dataset),
            )
            .route("/bigquery/v2/projects/{project}/queries", post(run_query))
            .route(
                "/bigquery/v2/projects/{project}/queries/{job}",
                get(query_results),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            addr,
            queries,
            task,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/bigquery/v2", self.addr)
    }

    /// Bodies received by `jobs.query`, in arrival order.
    pub fn received_queries(&self) -> Vec<Value> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Drop for MockBigQuery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.opts.token);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn google_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message, "status": "ERROR"}})),
    )
        .into_response()
}

async fn get_dataset(
    State(state): State<MockState>,
    Path((project, dataset)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    if !state.opts.dataset_exists {
        return google_error(
            StatusCode::NOT_FOUND,
            &format!("Not found: Dataset {project}:{dataset}"),
        );
    }
    Json(json!({
        "kind": "bigquery#dataset",
        "datasetReference": {"projectId": project, "datasetId": dataset}
    }))
    .into_response()
}

async fn run_query(
    State(state): State<MockState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    if let Ok(mut queries) = state.queries.lock() {
        queries.push(body);
    }
    if let Some((code, message)) = &state.opts.query_error {
        let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_REQUEST);
        return google_error(status, message);
    }
    if state.opts.defer_completion {
        return Json(json!({
            "kind": "bigquery#queryResponse",
            "jobComplete": false,
            "jobReference": {"projectId": project, "jobId": JOB_ID, "location": "US"}
        }))
        .into_response();
    }
    Json(complete_response(&project, &state.opts.rows)).into_response()
}

async fn query_results(
    State(state): State<MockState>,
    Path((project, job)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Request had invalid authentication credentials.");
    }
    if job != JOB_ID {
        return google_error(StatusCode::NOT_FOUND, &format!("Not found: Job {project}:{job}"));
    }
    Json(complete_response(&project, &state.opts.rows)).into_response()
}

fn complete_response(project: &str, rows: &[LogEntry]) -> Value {
    let fields: Vec<Value> = [
        ("timestamp", "TIMESTAMP"),
        ("severity", "STRING"),
        ("log_name", "STRING"),
        ("text_payload", "STRING"),
        ("json_payload", "STRING"),
        ("insert_id", "STRING"),
        ("resource_type", "STRING"),
        ("resource_labels", "STRING"),
        ("http_request", "STRING"),
        ("trace", "STRING"),
        ("span_id", "STRING"),
        ("source_location", "STRING"),
        ("labels", "STRING"),
        ("service_name", "STRING"),
    ]
    .iter()
    .map(|(name, ty)| json!({"name": name, "type": ty, "mode": "NULLABLE"}))
    .collect();

    json!({
        "kind": "bigquery#queryResponse",
        "jobComplete": true,
        "jobReference": {"projectId": project, "jobId": JOB_ID, "location": "US"},
        "schema": {"fields": fields},
        "totalRows": rows.len().to_string(),
        "rows": rows.iter().map(encode_row).collect::<Vec<_>>(),
    })
}

/// One entry in the `f`/`v` cell layout, with the timestamp as int64 micros.
pub fn encode_row(entry: &LogEntry) -> Value {
    let timestamp = DateTime::parse_from_rfc3339(&entry.timestamp.value)
        .map(|ts| ts.timestamp_micros().to_string())
        .unwrap_or_else(|_| entry.timestamp.value.clone());
    let cells = [
        Some(timestamp),
        Some(entry.severity.clone()),
        Some(entry.log_name.clone()),
        Some(entry.text_payload.clone().unwrap_or_default()),
        Some(entry.json_payload.clone()),
        Some(entry.insert_id.clone()),
        Some(entry.resource_type.clone()),
        Some(entry.resource_labels.clone()),
        Some(entry.http_request.clone()),
        entry.trace.clone(),
        entry.span_id.clone(),
        Some(entry.source_location.clone()),
        Some(entry.labels.clone()),
        Some(entry.service_name.clone()),
    ];
    json!({"f": cells.iter().map(|v| json!({"v": v})).collect::<Vec<_>>()})
}

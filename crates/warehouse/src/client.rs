use std::sync::Arc;

use async_trait::async_trait;
use logdash_core::config::Config;
use logdash_core::error::{DashError, Result};
use logdash_core::model::log::LogEntry;
use logdash_core::model::response::MAX_ROWS;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::auth::{Credentials, TokenProvider};
use crate::query::{QueryRequest, QueryResponse, decode_rows};
use crate::source::LogSource;

/// BigQuery REST v2 client bound to one project, dataset and table.
#[derive(Clone)]
pub struct BigQueryClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    dataset_id: String,
    table: String,
    tokens: Arc<TokenProvider>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

impl BigQueryClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("logdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashError::Internal(format!("failed to build http client: {e}")))?;

        let credentials = match &cfg.access_token {
            Some(token) => Credentials::StaticToken(token.clone()),
            None => Credentials::KeyFile(cfg.credentials_path.clone()),
        };

        Ok(Self {
            tokens: Arc::new(TokenProvider::new(
                credentials,
                http.clone(),
                cfg.token_lifetime,
            )),
            http,
            endpoint: cfg.bigquery_endpoint.trim_end_matches('/').to_string(),
            project_id: cfg.project_id.clone(),
            dataset_id: cfg.dataset_id.clone(),
            table: cfg.qualified_table(),
        })
    }

    fn project_url(&self) -> String {
        format!("{}/projects/{}", self.endpoint, self.project_id)
    }

    async fn get_query_results(&self, job_id: &str, location: Option<&str>) -> Result<QueryResponse> {
        let url = format!("{}/queries/{job_id}", self.project_url());
        let mut params = vec![
            ("maxResults", MAX_ROWS.to_string()),
            ("formatOptions.useInt64Timestamp", "true".to_string()),
        ];
        if let Some(location) = location {
            params.push(("location", location.to_string()));
        }

        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error("query results request", e))?;
        read_json(response, "query results").await
    }
}

#[async_trait]
impl LogSource for BigQueryClient {
    async fn check_dataset(&self) -> Result<()> {
        let url = format!("{}/datasets/{}", self.project_url(), self.dataset_id);
        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error("dataset check", e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(DashError::UpstreamUnavailable(format!(
                "dataset {}:{} not found",
                self.project_id, self.dataset_id
            ))),
            status => Err(upstream_status("dataset check", status, response).await),
        }
    }

    async fn query_recent(&self) -> Result<Vec<LogEntry>> {
        let url = format!("{}/queries", self.project_url());
        let token = self.tokens.bearer().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&QueryRequest::for_table(&self.table))
            .send()
            .await
            .map_err(|e| transport_error("query request", e))?;
        let mut result: QueryResponse = read_json(response, "query").await?;

        while !result.job_complete {
            let Some(job) = result.job_reference.take() else {
                return Err(DashError::UpstreamUnavailable(
                    "query did not complete and returned no job reference".to_string(),
                ));
            };
            tracing::debug!(job_id = %job.job_id, "query still running, reading results");
            result = self
                .get_query_results(&job.job_id, job.location.as_deref())
                .await?;
            if result.job_reference.is_none() {
                result.job_reference = Some(job);
            }
        }

        let schema = result.schema.unwrap_or_default();
        let logs = decode_rows(&schema, &result.rows)?;
        tracing::info!(rows = logs.len(), table = %self.table, "warehouse query complete");
        Ok(logs)
    }
}

fn transport_error(what: &str, err: reqwest::Error) -> DashError {
    DashError::UpstreamUnavailable(format!("{what} failed: {}", err.without_url()))
}

async fn upstream_status(what: &str, status: StatusCode, response: Response) -> DashError {
    let message = response
        .json::<GoogleErrorBody>()
        .await
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
    DashError::UpstreamUnavailable(format!("{what} returned {}: {message}", status.as_u16()))
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(upstream_status(what, status, response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| {
            DashError::UpstreamUnavailable(format!(
                "{what} response unreadable: {}",
                e.without_url()
            ))
        })
}

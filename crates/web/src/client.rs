use logdash_core::error::{DashError, Result};
use logdash_core::model::response::{ErrorResponse, FETCH_FAILED, LogsResponse};
use reqwest::header::{CACHE_CONTROL, PRAGMA};

/// HTTP client for the gateway, used by the page and by `logdash logs`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
}

impl GatewayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One uncached GET of the gateway.
    pub async fn fetch_logs(&self) -> Result<LogsResponse> {
        let response = self
            .http
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| DashError::UpstreamUnavailable(format!("{FETCH_FAILED}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let details = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.details)
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| FETCH_FAILED.to_string());
            tracing::warn!(%status, %details, "gateway returned an error");
            return Err(DashError::UpstreamUnavailable(details));
        }

        response.json::<LogsResponse>().await.map_err(|e| {
            DashError::UpstreamUnavailable(format!("gateway response unreadable: {e}"))
        })
    }
}

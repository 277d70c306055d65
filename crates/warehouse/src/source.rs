use async_trait::async_trait;
use logdash_core::error::Result;
use logdash_core::model::log::LogEntry;
use logdash_core::model::response::MAX_ROWS;

/// Where the gateway reads log rows from.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fails with `UpstreamUnavailable` when the target dataset cannot be reached.
    async fn check_dataset(&self) -> Result<()>;

    /// Newest rows first, at most [`MAX_ROWS`].
    async fn query_recent(&self) -> Result<Vec<LogEntry>>;
}

/// Dataset check followed by the fixed query, awaited one after the other.
pub async fn fetch_recent_logs(source: &dyn LogSource) -> Result<Vec<LogEntry>> {
    source.check_dataset().await?;
    let mut logs = source.query_recent().await?;
    logs.truncate(MAX_ROWS);
    tracing::debug!(rows = logs.len(), "fetched recent logs");
    Ok(logs)
}

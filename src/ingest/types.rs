// src/ingest/types.rs
use crate::snapshot::DashboardSnapshot;

/// Fatal acquisition failures. The engine itself never errors; these are the
/// only reasons a dashboard cannot be produced.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("payload has no result")]
    MissingResult,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading snapshot file: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, AcquireError>;
    fn name(&self) -> &'static str;
}

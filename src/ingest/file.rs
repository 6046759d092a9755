// src/ingest/file.rs
use std::path::PathBuf;

use async_trait::async_trait;

use super::{fingerprint, parse_snapshot_or_envelope, AcquireError, SnapshotSource};
use crate::snapshot::DashboardSnapshot;

/// Reads a snapshot from disk on every fetch (fixtures, offline runs).
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, AcquireError> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        tracing::debug!(
            target: "ingest",
            path = %self.path.display(),
            fingerprint = %fingerprint(body.as_bytes()),
            "snapshot file read"
        );
        parse_snapshot_or_envelope(&body)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

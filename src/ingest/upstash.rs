// src/ingest/upstash.rs
use async_trait::async_trait;

use super::{fingerprint, parse_envelope, AcquireError, SnapshotSource};
use crate::config::UpstashConfig;
use crate::snapshot::DashboardSnapshot;

/// Single authenticated GET against one key of an Upstash Redis REST store.
pub struct UpstashSource {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl UpstashSource {
    pub fn new(base_url: &str, key: &str, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/get/{}", base_url.trim_end_matches('/'), key),
            token: token.into(),
        }
    }

    pub fn from_config(cfg: &UpstashConfig) -> anyhow::Result<Self> {
        if cfg.url.is_empty() {
            anyhow::bail!("upstash url is not configured");
        }
        Ok(Self::new(&cfg.url, &cfg.key, cfg.bearer_token()?))
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for UpstashSource {
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, AcquireError> {
        let resp = self
            .client
            .get(&self.url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AcquireError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        tracing::debug!(
            target: "ingest",
            bytes = body.len(),
            fingerprint = %fingerprint(body.as_bytes()),
            "upstash payload received"
        );
        parse_envelope(&body)
    }

    fn name(&self) -> &'static str {
        "upstash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_key() {
        let s = UpstashSource::new("https://kv.example.io/", "crypto_dashboard:latest", "t");
        assert_eq!(
            s.endpoint(),
            "https://kv.example.io/get/crypto_dashboard:latest"
        );
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let cfg = UpstashConfig {
            token: "t".into(),
            ..Default::default()
        };
        assert!(UpstashSource::from_config(&cfg).is_err());
    }
}

// src/config/desk.rs
use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::analyze::flow::FlowParams;
use crate::rank::MacroWindow;

pub const ENV_UPSTASH_TOKEN: &str = "UPSTASH_READ_TOKEN";
pub const ENV_UPSTASH_URL: &str = "UPSTASH_REST_URL";
pub const ENV_UPSTASH_KEY: &str = "UPSTASH_KEY";

/// Upper bound for every day-count window (ten years).
pub const MAX_WINDOW_DAYS: i64 = 3650;

fn default_key() -> String {
    "crypto_dashboard:latest".to_string()
}
fn default_token() -> String {
    "ENV".to_string()
}
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub upstash: UpstashConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstashConfig {
    /// REST base URL, e.g. `https://example.upstash.io`.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_key")]
    pub key: String,
    /// "ENV" means: read from UPSTASH_READ_TOKEN at fetch time.
    #[serde(default = "default_token")]
    pub token: String,
}

impl Default for UpstashConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: default_key(),
            token: default_token(),
        }
    }
}

impl UpstashConfig {
    /// Resolve the bearer token ("ENV" → environment).
    pub fn bearer_token(&self) -> Result<String> {
        if self.token.trim().eq_ignore_ascii_case("env") {
            return env::var(ENV_UPSTASH_TOKEN)
                .map_err(|_| anyhow!("Missing {ENV_UPSTASH_TOKEN} env var"));
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Engine thresholds and windows. Anything out of range falls back to the
/// default for that field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub flow_window_days: i64,
    pub etf_min_usd: f64,
    pub liquidation_min_usd: f64,
    pub liquidation_span_chars: usize,
    pub macro_past_days: i64,
    pub macro_future_days: i64,
    pub risk_top_n: usize,
    pub duplicate_similarity: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            flow_window_days: 7,
            etf_min_usd: 5_000_000.0,
            liquidation_min_usd: 1_000_000.0,
            liquidation_span_chars: 60,
            macro_past_days: 90,
            macro_future_days: 365,
            risk_top_n: 8,
            duplicate_similarity: 0.92,
        }
    }
}

impl EngineParams {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !(1..=MAX_WINDOW_DAYS).contains(&self.flow_window_days) {
            self.flow_window_days = d.flow_window_days;
        }
        if !(self.etf_min_usd.is_finite() && self.etf_min_usd >= 0.0) {
            self.etf_min_usd = d.etf_min_usd;
        }
        if !(self.liquidation_min_usd.is_finite() && self.liquidation_min_usd >= 0.0) {
            self.liquidation_min_usd = d.liquidation_min_usd;
        }
        if self.liquidation_span_chars == 0 {
            self.liquidation_span_chars = d.liquidation_span_chars;
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.macro_past_days) {
            self.macro_past_days = d.macro_past_days;
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.macro_future_days) {
            self.macro_future_days = d.macro_future_days;
        }
        if self.risk_top_n == 0 {
            self.risk_top_n = d.risk_top_n;
        }
        if !(self.duplicate_similarity > 0.0 && self.duplicate_similarity <= 1.0) {
            self.duplicate_similarity = d.duplicate_similarity;
        }
        self
    }

    pub fn flow_params(&self) -> FlowParams {
        FlowParams {
            window: days(self.flow_window_days),
            etf_min_usd: self.etf_min_usd,
            liquidation_min_usd: self.liquidation_min_usd,
            liquidation_span_chars: self.liquidation_span_chars,
        }
    }

    pub fn macro_window(&self) -> MacroWindow {
        MacroWindow {
            past: days(self.macro_past_days),
            future: days(self.macro_future_days),
        }
    }
}

/// Saturates instead of panicking on out-of-range day counts.
fn days(n: i64) -> Duration {
    Duration::try_days(n).unwrap_or(if n < 0 { Duration::MIN } else { Duration::MAX })
}

impl DeskConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading desk config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: DeskConfig = toml::from_str(s).context("parsing desk config")?;
        Ok(cfg.finish())
    }

    /// Env overrides + sanitising; applied to every loaded config.
    fn finish(mut self) -> Self {
        if let Ok(url) = env::var(ENV_UPSTASH_URL) {
            if !url.trim().is_empty() {
                self.upstash.url = url.trim().to_string();
            }
        }
        if let Ok(key) = env::var(ENV_UPSTASH_KEY) {
            if !key.trim().is_empty() {
                self.upstash.key = key.trim().to_string();
            }
        }
        self.upstash.url = self.upstash.url.trim_end_matches('/').to_string();
        self.engine = self.engine.sanitized();
        self
    }
}

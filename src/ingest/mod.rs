// src/ingest/mod.rs
pub mod file;
pub mod types;
pub mod upstash;

pub use file::FileSource;
pub use types::{AcquireError, SnapshotSource};
pub use upstash::UpstashSource;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::snapshot::DashboardSnapshot;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("snapshot_fetch_total", "Snapshot fetch attempts.");
        describe_counter!(
            "snapshot_fetch_errors_total",
            "Snapshot fetches that failed (any AcquireError)."
        );
        describe_histogram!("snapshot_fetch_ms", "Snapshot fetch time in milliseconds.");
        describe_counter!("dashboard_builds_total", "Dashboard views built.");
        describe_counter!(
            "flow_records_discarded_total",
            "Signals skipped by the flow aggregator, by metric and reason."
        );
    });
}

/// Short SHA-256 prefix of a raw payload; safe to log.
pub fn fingerprint(raw: &[u8]) -> String {
    let digest = Sha256::digest(raw);
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a key-value store envelope: `{"result": <string|object>}`.
/// A string result is parsed once more as JSON.
pub fn parse_envelope(body: &str) -> Result<DashboardSnapshot, AcquireError> {
    let root: Value = serde_json::from_str(body)?;
    let Value::Object(mut map) = root else {
        return Err(AcquireError::Malformed("envelope is not an object".into()));
    };
    match map.remove("result") {
        None | Some(Value::Null) => Err(AcquireError::MissingResult),
        Some(Value::String(inner)) => snapshot_from_value(serde_json::from_str(&inner)?),
        Some(v @ Value::Object(_)) => snapshot_from_value(v),
        Some(other) => Err(AcquireError::Malformed(format!(
            "result is {}",
            json_kind(&other)
        ))),
    }
}

/// File payloads may be a bare snapshot or an envelope.
pub fn parse_snapshot_or_envelope(body: &str) -> Result<DashboardSnapshot, AcquireError> {
    let root: Value = serde_json::from_str(body)?;
    match &root {
        Value::Object(map) if map.contains_key("result") => parse_envelope(body),
        _ => snapshot_from_value(root),
    }
}

fn snapshot_from_value(v: Value) -> Result<DashboardSnapshot, AcquireError> {
    if !v.is_object() {
        return Err(AcquireError::Malformed(format!(
            "snapshot is {}",
            json_kind(&v)
        )));
    }
    Ok(serde_json::from_value(v)?)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fetch once from `source`, recording timing and error metrics. No retry.
pub async fn fetch_once(source: &dyn SnapshotSource) -> Result<DashboardSnapshot, AcquireError> {
    ensure_metrics_described();
    counter!("snapshot_fetch_total", "source" => source.name()).increment(1);

    let t0 = std::time::Instant::now();
    let res = source.fetch_snapshot().await;
    histogram!("snapshot_fetch_ms", "source" => source.name())
        .record(t0.elapsed().as_secs_f64() * 1000.0);

    if let Err(e) = &res {
        tracing::warn!(target: "ingest", error = %e, source = source.name(), "snapshot fetch failed");
        counter!("snapshot_fetch_errors_total", "source" => source.name()).increment(1);
    }
    res
}

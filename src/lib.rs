// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod metrics;
pub mod rank;
pub mod snapshot;
pub mod timeutil;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{DeskConfig, EngineParams};
pub use crate::engine::{build_view, DashboardView, ViewOptions};
pub use crate::ingest::{AcquireError, FileSource, SnapshotSource, UpstashSource};
pub use crate::snapshot::DashboardSnapshot;

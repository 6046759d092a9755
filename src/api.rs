use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::config::EngineParams;
use crate::engine::{build_view, DashboardView, ViewOptions};
use crate::ingest::{fetch_once, AcquireError, SnapshotSource};
use crate::snapshot::DashboardSnapshot;

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn SnapshotSource>,
    params: EngineParams,
}

impl AppState {
    pub fn new(source: Arc<dyn SnapshotSource>, params: EngineParams) -> Self {
        Self { source, params }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dashboard", get(dashboard))
        .route("/interpret", post(interpret))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
struct ViewQuery {
    #[serde(default)]
    high_impact: Option<String>,
}

impl ViewQuery {
    fn only_high_impact(&self) -> bool {
        matches!(
            self.high_impact.as_deref().map(str::trim),
            Some("1") | Some("true") | Some("yes")
        )
    }
}

/// Acquisition failure surfaced to the renderer as a failed state.
struct ApiError(AcquireError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "state": "failed",
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<ViewQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    let snap = fetch_once(state.source.as_ref()).await.map_err(ApiError)?;
    Ok(Json(render(&snap, &q, &state.params)))
}

async fn interpret(
    State(state): State<AppState>,
    Query(q): Query<ViewQuery>,
    Json(snap): Json<DashboardSnapshot>,
) -> Json<DashboardView> {
    Json(render(&snap, &q, &state.params))
}

fn render(snap: &DashboardSnapshot, q: &ViewQuery, params: &EngineParams) -> DashboardView {
    let opts = ViewOptions {
        now: Utc::now(),
        only_high_impact: q.only_high_impact(),
    };
    build_view(snap, &opts, params)
}

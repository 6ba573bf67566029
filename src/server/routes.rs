//! Workflow endpoints.
//!
//! | Method | Path                         | Handler              |
//! |--------|------------------------------|----------------------|
//! | POST   | `/workflow/execute`          | [`execute`]          |
//! | POST   | `/workflow/execute-sync`     | [`execute_sync`]     |
//! | GET    | `/workflow/status/{run_id}`  | [`status`]           |
//! | GET    | `/workflow/list`             | [`list`]             |
//! | DELETE | `/workflow/cleanup`          | [`cleanup`]          |
//! | GET    | `/workflow/health`           | [`health`]           |

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::content::ContentType;
use crate::workflow::{RunId, RunRecord, RunStatus, RunSummary};

use super::error::ApiError;
use super::AppState;

/// Body of the execute endpoints. Omitted fields default from settings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteBody {
    pub source_identifier: Option<String>,
    pub item_count: Option<u32>,
    pub type_filter: Option<ContentType>,
    pub per_step_timeout_seconds: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub run_id: RunId,
    pub status: RunStatus,
}

/// A run record plus derived progress.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub record: RunRecord,
    pub progress: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub runs: Vec<RunSummary>,
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(rename = "olderThan")]
    pub older_than: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: usize,
    pub remaining: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_runs: usize,
    pub total_runs: usize,
    pub default_source_identifier: Option<String>,
    pub default_item_count: u32,
    pub step_timeout_seconds: f64,
    pub auto_posting_enabled: bool,
    pub demo_mode: bool,
}

/// Routes mounted under `/workflow`.
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/execute", post(execute))
        .route("/execute-sync", post(execute_sync))
        .route("/status/{run_id}", get(status))
        .route("/list", get(list))
        .route("/cleanup", delete(cleanup))
        .route("/health", get(health))
}

fn resolve(state: &AppState, body: ExecuteBody) -> Result<crate::workflow::RunRequest, ApiError> {
    Ok(state.settings.resolve_request(
        body.source_identifier,
        body.item_count,
        body.type_filter,
        body.per_step_timeout_seconds,
    )?)
}

/// POST /workflow/execute - Start a run in the background.
pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ExecuteResponse>), ApiError> {
    let Json(body) = payload?;
    let request = resolve(&state, body)?;
    let run_id = state.executor.start_run(request)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ExecuteResponse {
            run_id,
            status: RunStatus::Pending,
        }),
    ))
}

/// POST /workflow/execute-sync - Run to completion and return the record.
pub async fn execute_sync(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteBody>, JsonRejection>,
) -> Result<Json<RunRecord>, ApiError> {
    let Json(body) = payload?;
    let request = resolve(&state, body)?;
    let record = state.executor.run_sync(request).await?;
    Ok(Json(record))
}

/// GET /workflow/status/{run_id} - Current snapshot of a run.
pub async fn status(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<StatusView>, ApiError> {
    let run_id: RunId = run_id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("run {} not found", run_id)))?;

    let record = state.executor.store().get(&run_id)?;
    let progress = record.progress();
    Ok(Json(StatusView { record, progress }))
}

/// GET /workflow/list - All known runs in creation order.
pub async fn list(State(state): State<AppState>) -> Json<ListResponse> {
    let runs = state.executor.store().list();
    let total_count = runs.len();
    Json(ListResponse { runs, total_count })
}

/// DELETE /workflow/cleanup?olderThan=2h - Evict old finished runs.
pub async fn cleanup(
    State(state): State<AppState>,
    query: Result<Query<CleanupQuery>, QueryRejection>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let Query(query) = query?;

    let age = match query.older_than {
        Some(raw) => humantime::parse_duration(&raw)
            .map_err(|e| ApiError::BadRequest(format!("invalid olderThan '{}': {}", raw, e)))?,
        None => state.settings.cleanup_age(),
    };

    let store = state.executor.store();
    let removed = store.evict_older_than(age);

    Ok(Json(CleanupResponse {
        removed,
        remaining: store.len(),
    }))
}

/// GET /workflow/health - Liveness plus effective configuration.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.executor.store();
    let settings = &state.settings;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        active_runs: store.active_count(),
        total_runs: store.len(),
        default_source_identifier: settings.default_source_identifier.clone(),
        default_item_count: settings.default_item_count,
        step_timeout_seconds: settings.default_step_timeout_seconds,
        auto_posting_enabled: settings.auto_posting_enabled,
        demo_mode: settings.demo_mode,
    })
}

//! Route handlers: thin marshalling around the synchronous store.
//!
//! Every storage call runs on the blocking pool; the store's short-lived
//! operations never block the async executor.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use engram_core::{
    AddObservationParams, AddPromptParams, CaptureResult, Observation, PassiveCaptureParams,
    SearchOptions, SearchResult, Stats, TimelineResult, UpdateObservationParams,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api_error::ApiError;
use crate::AppState;

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> engram_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("join error: {e}")))?
        .map_err(ApiError::from)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub directory: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let storage = state.storage.clone();
    let id = body.id.clone();
    blocking(move || storage.create_session(&body.id, &body.project, &body.directory)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Deserialize)]
pub struct EndSessionBody {
    #[serde(default)]
    pub summary: Option<String>,
}

pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EndSessionBody>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.clone();
    let session_id = id.clone();
    blocking(move || storage.end_session(&session_id, body.summary.as_deref())).await?;
    Ok(Json(json!({ "id": id, "ended": true })))
}

pub async fn add_observation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddObservationParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let storage = state.storage.clone();
    let id = blocking(move || storage.add_observation(&body)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn get_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Observation>, ApiError> {
    let storage = state.storage.clone();
    let obs = blocking(move || storage.get_observation(id)).await?;
    Ok(Json(obs))
}

pub async fn update_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateObservationParams>,
) -> Result<Json<Observation>, ApiError> {
    let storage = state.storage.clone();
    let obs = blocking(move || storage.update_observation(id, &body)).await?;
    Ok(Json(obs))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

pub async fn delete_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.clone();
    blocking(move || storage.delete_observation(id, query.hard)).await?;
    let mode = if query.hard { "hard" } else { "soft" };
    Ok(Json(json!({ "id": id, "deleted": mode })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn list_observations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let storage = state.storage.clone();
    let rows = blocking(move || {
        storage.all_observations(
            query.project.as_deref(),
            query.scope.as_deref(),
            query.limit.unwrap_or(0),
        )
    })
    .await?;
    Ok(Json(rows))
}

pub async fn passive_capture(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PassiveCaptureParams>,
) -> Result<Json<CaptureResult>, ApiError> {
    // The HTTP surface requires an explicit session; only the MCP adapter
    // defaults to manual-save.
    if body.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("session_id is required".to_owned()));
    }
    let storage = state.storage.clone();
    let result = blocking(move || storage.passive_capture(&body)).await?;
    Ok(Json(result))
}

pub async fn add_prompt(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddPromptParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let storage = state.storage.clone();
    let id = blocking(move || storage.add_prompt(&body)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let storage = state.storage.clone();
    let results = blocking(move || {
        let opts = SearchOptions {
            kind: query.kind,
            project: query.project,
            scope: query.scope,
            limit: query.limit,
        };
        storage.search(&query.q, &opts)
    })
    .await?;
    Ok(Json(results))
}

pub async fn search_prompts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.clone();
    let results = blocking(move || {
        storage.search_prompts(&query.q, query.project.as_deref(), query.limit.unwrap_or(0))
    })
    .await?;
    Ok(Json(json!(results)))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.clone();
    let context = blocking(move || {
        storage.format_context(query.project.as_deref(), query.scope.as_deref())
    })
    .await?;
    Ok(Json(json!({ "context": context })))
}

#[derive(Deserialize)]
pub struct TimelineQuery {
    #[serde(default)]
    pub before: Option<i64>,
    #[serde(default)]
    pub after: Option<i64>,
}

pub async fn timeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineResult>, ApiError> {
    let storage = state.storage.clone();
    let result = blocking(move || storage.timeline(id, query.before, query.after)).await?;
    Ok(Json(result))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, ApiError> {
    let storage = state.storage.clone();
    let stats = blocking(move || storage.stats()).await?;
    Ok(Json(stats))
}

//! Logger API endpoints

pub mod types;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthError;
use crate::api::types::ApiError;
use crate::data::logs::{LogRecord, LogService};

use types::{SUBMIT_SUCCESS_MESSAGE, SubmitParams};

/// Shared state for Logger API endpoints
#[derive(Clone)]
pub struct LogsApiState {
    pub logs: Arc<LogService>,
}

/// Build Logger API routes (mounted at `/api/log`)
pub fn routes(logs: Arc<LogService>) -> Router<()> {
    Router::new()
        .route("/api/log", get(list_logs))
        .route("/api/log/", get(list_logs))
        .route("/api/log/submit", post(submit_logs))
        .route("/api/log/{id}", get(get_log))
        .with_state(LogsApiState { logs })
}

/// Every stored record
pub async fn list_logs(
    State(state): State<LogsApiState>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    Ok(Json(state.logs.list().await?))
}

pub async fn get_log(
    State(state): State<LogsApiState>,
    Path(id): Path<String>,
) -> Result<Json<LogRecord>, ApiError> {
    state
        .logs
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::resource_not_found(&id))
}

/// Store a submitted batch; the `authcode` query parameter must match
pub async fn submit_logs(
    State(state): State<LogsApiState>,
    Query(params): Query<SubmitParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Response> {
    if !state.logs.authorize(params.authcode.as_deref()) {
        tracing::warn!("Log submission with invalid auth code");
        return Err(AuthError::invalid_auth_code().into_response());
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("EMPTY_BODY", "Request body is empty").into_response());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let count = state
        .logs
        .ingest(&body, content_type)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    tracing::debug!(count, bytes = body.len(), "Log batch submitted");
    Ok(Json(SUBMIT_SUCCESS_MESSAGE).into_response())
}

//! Issue API endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::extractors::{IssueIdPath, IssueSelector, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::IssueRepository;
use crate::domain::issues::issue_timestamp_now;
use crate::domain::{Issue, is_valid_issue_id};

use types::{SearchParams, resource_message};

/// Shared state for Issue API endpoints
#[derive(Clone)]
pub struct IssuesApiState {
    pub issues: Arc<dyn IssueRepository>,
}

/// Build Issue API routes (mounted at `/api/issues`)
pub fn routes(issues: Arc<dyn IssueRepository>) -> Router<()> {
    let state = IssuesApiState { issues };

    Router::new()
        .route("/api/issues", get(list_issues).post(create_issue))
        .route("/api/issues/", get(list_issues).post(create_issue))
        .route("/api/issues/search", get(search_issues))
        .route("/api/issues/GetIssueCollection", post(get_issue_collection))
        .route(
            "/api/issues/{id}",
            get(get_issues).put(update_issue).delete(delete_issue),
        )
        .with_state(state)
}

/// Every stored issue
pub async fn list_issues(
    State(state): State<IssuesApiState>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    Ok(Json(state.issues.find_all().await?))
}

/// One issue by id, or every issue of a `(id1,id2,...)` list
pub async fn get_issues(
    State(state): State<IssuesApiState>,
    selector: IssueSelector,
) -> Result<Response, ApiError> {
    match selector {
        IssueSelector::One(id) => {
            let issue = state
                .issues
                .find_by_id(&id)
                .await?
                .ok_or_else(|| ApiError::resource_not_found(&id))?;
            Ok(Json(issue).into_response())
        }
        IssueSelector::Many(ids) => {
            let issues = state.issues.find_by_ids(&ids).await?;
            Ok(Json(issues).into_response())
        }
    }
}

/// Issues for a JSON array of ids; malformed ids are skipped
pub async fn get_issue_collection(
    State(state): State<IssuesApiState>,
    Json(ids): Json<Vec<String>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let ids: Vec<String> = ids.into_iter().filter(|id| is_valid_issue_id(id)).collect();
    Ok(Json(state.issues.find_by_ids(&ids).await?))
}

/// Issues matching a filter expression; no filter returns everything
pub async fn search_issues(
    State(state): State<IssuesApiState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let issues = match params.into_query()? {
        Some(query) => state.issues.search(&query).await?,
        None => state.issues.find_all().await?,
    };
    Ok(Json(issues))
}

/// Store a new issue stamped with the current time
pub async fn create_issue(
    State(state): State<IssuesApiState>,
    ValidatedJson(mut issue): ValidatedJson<Issue>,
) -> Result<Json<String>, ApiError> {
    let now = issue_timestamp_now();
    issue.id = None;
    issue.submission_date = Some(now);
    issue.updated_date = Some(now);

    let id = state.issues.insert(issue).await?;
    tracing::info!(id = %id, "Issue submitted");
    Ok(Json(resource_message(&id, "submitted")))
}

/// Replace an existing issue
pub async fn update_issue(
    State(state): State<IssuesApiState>,
    IssueIdPath(id): IssueIdPath,
    ValidatedJson(mut issue): ValidatedJson<Issue>,
) -> Result<Json<String>, ApiError> {
    let existing = state
        .issues
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(&id))?;

    issue.submission_date = issue.submission_date.or(existing.submission_date);
    issue.updated_date = Some(issue_timestamp_now());

    // Deleted between the lookup and the write
    if !state.issues.replace(&id, issue).await? {
        return Err(ApiError::resource_not_found(&id));
    }
    tracing::info!(id = %id, "Issue updated");
    Ok(Json(resource_message(&id, "updated")))
}

pub async fn delete_issue(
    State(state): State<IssuesApiState>,
    IssueIdPath(id): IssueIdPath,
) -> Result<Json<String>, ApiError> {
    if !state.issues.delete(&id).await? {
        return Err(ApiError::resource_not_found(&id));
    }
    tracing::info!(id = %id, "Issue removed");
    Ok(Json(resource_message(&id, "removed")))
}

//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::is_valid_issue_id;
use crate::utils::string::parse_id_list;

/// Validated issue id from the `{id}` path segment.
///
/// Returns a 400 Bad Request unless the id is 24 hex characters.
#[derive(Debug)]
pub struct IssueIdPath(pub String);

impl<S> FromRequestParts<S> for IssueIdPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_issue_id(&id) {
            return Err(ValidationRejection::InvalidIssueId(id));
        }
        Ok(Self(id))
    }
}

/// The `{id}` segment of a read route: one id, or a parenthesized list.
///
/// `(a,b,c)` keeps only the well-formed ids; a single id must be well formed.
#[derive(Debug, PartialEq, Eq)]
pub enum IssueSelector {
    One(String),
    Many(Vec<String>),
}

impl IssueSelector {
    pub fn parse(segment: &str) -> Result<Self, ValidationRejection> {
        let trimmed = segment.trim();
        if trimmed.starts_with('(') && trimmed.ends_with(')') {
            let ids = parse_id_list(trimmed)
                .into_iter()
                .filter(|id| {
                    let valid = is_valid_issue_id(id);
                    if !valid {
                        tracing::debug!(id = %id, "Skipping malformed id in list");
                    }
                    valid
                })
                .collect();
            return Ok(Self::Many(ids));
        }
        if !is_valid_issue_id(trimmed) {
            return Err(ValidationRejection::InvalidIssueId(trimmed.to_string()));
        }
        Ok(Self::One(trimmed.to_string()))
    }
}

impl<S> FromRequestParts<S> for IssueSelector
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(segment) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;
        Self::parse(&segment)
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Issue id is not 24 hex characters
    InvalidIssueId(String),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidIssueId(id) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ID",
                format!("Request Parameter: {} is not a valid id", id),
            ),
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect();
    // Nested message errors are reported under the list field
    for (field, kind) in errors.errors() {
        if let validator::ValidationErrorsKind::List(items) = kind {
            for (index, nested) in items {
                messages.push(format!(
                    "{}[{}]: {}",
                    field,
                    index,
                    format_validation_errors(nested)
                ));
            }
        }
    }
    messages.sort();
    messages.join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::utils::crypto::secret_matches;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_REQUIRED",
            message: "Authorization header is required".to_string(),
        }
    }

    pub fn invalid_api_key() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "API_KEY_INVALID",
            message: "Authorization header is invalid".to_string(),
        }
    }

    pub fn invalid_auth_code() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_CODE_INVALID",
            message: "Authorization Code Invalid".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    /// Configured API key; `None` rejects every request
    pub api_key: Option<Arc<str>>,
}

impl AuthState {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(Arc::from),
        }
    }
}

/// Require the `Authorization` header to equal the configured API key
pub async fn require_api_key(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        tracing::debug!(path = %request.uri().path(), "Missing Authorization header");
        return Err(AuthError::required());
    };

    let presented = value.to_str().ok();
    if !secret_matches(presented, state.api_key.as_deref()) {
        tracing::debug!(path = %request.uri().path(), "Rejected Authorization header");
        return Err(AuthError::invalid_api_key());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use tower::ServiceExt;

    fn router(key: Option<&str>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                AuthState::new(key),
                require_api_key,
            ))
    }

    async fn status(router: Router, authorization: Option<&str>) -> StatusCode {
        let mut request = Request::builder().uri("/");
        if let Some(h) = authorization {
            request = request.header(header::AUTHORIZATION, h);
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_matching_key_passes() {
        assert_eq!(status(router(Some("key")), Some("key")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_rejected() {
        assert_eq!(status(router(Some("key")), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(router(Some("key")), Some("Bearer key")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_unconfigured_key_rejects_everything() {
        assert_eq!(status(router(None), Some("")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(router(None), Some("key")).await, StatusCode::UNAUTHORIZED);
    }
}

//! Client errors and their classification for callers

use thiserror::Error;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The service is currently unavailable, please try again later";
pub const INTERNAL_ERROR_MESSAGE: &str =
    "The remote service experienced an internal error, please try again later";
pub const UNKNOWN_REMOTE_ERROR_MESSAGE: &str =
    "The remote service experienced an unknown error, please try again later";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error: Please try again later";
pub const API_UNRESPONSIVE_MESSAGE: &str =
    "Connection Error: Remote api is unresponsive, please try again later";
pub const STORAGE_UNRESPONSIVE_MESSAGE: &str =
    "Connection Error: Remote Storage Service is unresponsive, please try again later";
pub const INVALID_FIELD_MESSAGE: &str =
    "Internal Error: One of the notes fields was invalid, please report the error for assistance";

/// How a failed repository call should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    BadRequest,
    Unauthorized,
    ServiceUnavailable,
    InternalError,
    UnknownError,
}

impl ErrorCategory {
    /// Category of a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            404 => Self::NotFound,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            503 => Self::ServiceUnavailable,
            500 => Self::InternalError,
            _ => Self::UnknownError,
        }
    }
}

/// Failure of a repository call, with a message safe to show a user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RepositoryError {
    pub category: ErrorCategory,
    pub message: String,
}

impl RepositoryError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Local validation failure; no request was sent
    pub fn invalid_field() -> Self {
        Self::new(ErrorCategory::BadRequest, INVALID_FIELD_MESSAGE)
    }

    pub fn unknown() -> Self {
        Self::new(ErrorCategory::UnknownError, UNKNOWN_ERROR_MESSAGE)
    }

    /// Map a transport or codec failure.
    ///
    /// Send failures become `ServiceUnavailable` with `unresponsive`; anything
    /// else (undecodable bodies, serialization) is an unknown error.
    pub fn from_client_error(error: ClientError, unresponsive: &str) -> Self {
        match &error {
            ClientError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                tracing::error!(error = %e, "Remote service unreachable");
                Self::new(ErrorCategory::ServiceUnavailable, unresponsive)
            }
            _ => {
                tracing::error!(error = %error, "Request failed");
                Self::unknown()
            }
        }
    }
}

/// Low-level failures of [`crate::HttpService`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unrecognized media type: {0}")]
    UnsupportedMediaType(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML serialization error: {0}")]
    XmlSerialize(#[from] quick_xml::SeError),

    #[error("XML deserialization error: {0}")]
    XmlDeserialize(#[from] quick_xml::DeError),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("{0} cannot be empty")]
    MissingSetting(&'static str),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

//! Shared HTTP plumbing for the repository clients
//!
//! [`HttpService`] owns one `reqwest::Client` with a fixed timeout and the
//! caller's default headers. Every request carries `Accept` and
//! `Content-Type` for the configured [`MediaType`]; bodies are serialized
//! with `serde_json` or `quick-xml` accordingly.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{
    ClientError, ErrorCategory, INTERNAL_ERROR_MESSAGE, RepositoryError,
    SERVICE_UNAVAILABLE_MESSAGE, UNKNOWN_REMOTE_ERROR_MESSAGE,
};

/// Body serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Json,
    Xml,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Media type named by a `Content-Type` value, parameters ignored
    pub fn from_content_type(value: &str) -> Result<Self, ClientError> {
        let lower = value.to_ascii_lowercase();
        if lower.contains("json") {
            Ok(Self::Json)
        } else if lower.contains("xml") {
            Ok(Self::Xml)
        } else {
            Err(ClientError::UnsupportedMediaType(value.to_string()))
        }
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, record: &T) -> Result<String, ClientError> {
        match self {
            Self::Json => Ok(serde_json::to_string(record)?),
            Self::Xml => Ok(quick_xml::se::to_string(record)?),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self, body: &str) -> Result<T, ClientError> {
        match self {
            Self::Json => Ok(serde_json::from_str(body)?),
            Self::Xml => Ok(quick_xml::de::from_str(body)?),
        }
    }
}

/// Preconfigured client for one remote service
#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
    media_type: MediaType,
}

impl HttpService {
    /// `base_url` gains a trailing `/` so relative paths append cleanly
    pub fn new(
        base_url: &str,
        timeout: Duration,
        media_type: MediaType,
        default_headers: HeaderMap,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ClientError::MissingSetting("base url"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            media_type,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let media_type = self.media_type.as_str();
        self.client
            .request(method, self.url(path))
            .header(ACCEPT, media_type)
            .header(CONTENT_TYPE, media_type)
    }

    pub async fn query(&self, path: &str) -> Result<Response, ClientError> {
        tracing::debug!(path, "GET");
        Ok(self.request(Method::GET, path).send().await?)
    }

    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        path: &str,
        record: &T,
    ) -> Result<Response, ClientError> {
        let body = self.media_type.serialize(record)?;
        tracing::debug!(path, bytes = body.len(), "POST");
        Ok(self.request(Method::POST, path).body(body).send().await?)
    }

    pub async fn update<T: Serialize + ?Sized>(
        &self,
        path: &str,
        record: &T,
    ) -> Result<Response, ClientError> {
        let body = self.media_type.serialize(record)?;
        tracing::debug!(path, bytes = body.len(), "PUT");
        Ok(self.request(Method::PUT, path).body(body).send().await?)
    }

    /// DELETE with `If-Match: *`, which OData services require
    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        tracing::debug!(path, "DELETE");
        Ok(self
            .request(Method::DELETE, path)
            .header(IF_MATCH, "*")
            .send()
            .await?)
    }

    /// Decode a success body in the media type the response declares
    pub async fn read_body<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let media_type = match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(value) => MediaType::from_content_type(value)?,
            None => self.media_type,
        };
        let body = response.text().await?;
        media_type.deserialize(&body)
    }
}

/// Message carried by an error body.
///
/// Accepts a JSON string, a JSON object with a `message` field, or raw text;
/// an empty body falls back to the status reason phrase.
fn remote_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(message)) => return message,
        Ok(Value::Object(map)) => {
            if let Some(Value::String(message)) = map.get("message") {
                return message.clone();
            }
        }
        _ => {}
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Classify a non-success status and its body
pub fn classify(status: StatusCode, body: &str) -> RepositoryError {
    let category = ErrorCategory::from_status(status);
    let message = match category {
        ErrorCategory::NotFound | ErrorCategory::BadRequest | ErrorCategory::Unauthorized => {
            remote_message(status, body)
        }
        ErrorCategory::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        ErrorCategory::InternalError => {
            tracing::error!(status = %status, body, "Remote service internal error");
            INTERNAL_ERROR_MESSAGE.to_string()
        }
        ErrorCategory::UnknownError => {
            tracing::error!(status = %status, body, "Remote service unknown error");
            UNKNOWN_REMOTE_ERROR_MESSAGE.to_string()
        }
    };
    RepositoryError::new(category, message)
}

/// Read and classify a non-success response
pub async fn classify_response(response: Response) -> RepositoryError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read error body");
            String::new()
        }
    };
    classify(status, &body)
}

//! Log record schema
//!
//! Submitted batches are decoded into [`LogEvent`]s with ordered, typed
//! fields. Bodies that do not match the batch schema are kept whole as a
//! [`RawPayload`] so they can be reprocessed later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::constants::LOG_UNKNOWN_SOURCE;

/// Property holding the name of the submitting application
pub const APPLICATION_PROPERTY: &str = "Application";

/// Level used for raw payloads
pub const RAW_LEVEL: &str = "Raw";

const DEFAULT_LEVEL: &str = "Information";

/// Typed value of a structured field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Arrays, objects, and integers outside `i64`, as compact JSON
    Json(String),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Integer(i),
                (None, Some(f)) if !n.is_u64() => Self::Float(f),
                _ => Self::Json(n.to_string()),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Json(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogField {
    pub key: String,
    pub value: FieldValue,
}

/// Structured log event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    pub source: String,
    /// Ingestion day, `dd-MM-yyyy`
    pub date: String,
    /// Timestamp reported by the client, verbatim
    pub timestamp: Option<String>,
    pub level: String,
    pub message_template: Option<String>,
    pub message: Option<String>,
    pub fields: Vec<LogField>,
}

/// Body that did not match the batch schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    pub id: String,
    pub source: String,
    pub date: String,
    pub received_at: DateTime<Utc>,
    pub content_type: Option<String>,
    #[serde(with = "crate::utils::encoding::base64_bytes")]
    pub bytes: Vec<u8>,
}

/// One stored log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRecord {
    Event(LogEvent),
    Raw(RawPayload),
}

impl LogRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Event(e) => &e.id,
            Self::Raw(r) => &r.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Event(e) => &e.source,
            Self::Raw(r) => &r.source,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Self::Event(e) => &e.date,
            Self::Raw(r) => &r.date,
        }
    }

    pub fn level(&self) -> &str {
        match self {
            Self::Event(e) => &e.level,
            Self::Raw(_) => RAW_LEVEL,
        }
    }
}

/// Batch body accepted by the submit endpoint
#[derive(Debug, Deserialize)]
pub struct SubmitBatch {
    pub events: Vec<SubmittedEvent>,
}

/// One event of a submitted batch
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmittedEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message_template: Option<String>,
    #[serde(default)]
    pub rendered_message: Option<String>,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl LogEvent {
    /// Build a structured event stamped with the ingestion `date`
    pub fn from_submitted(event: SubmittedEvent, date: &str) -> Self {
        let mut properties = event.properties;
        let source = properties
            .shift_remove(APPLICATION_PROPERTY)
            .and_then(|v| v.as_str().map(String::from))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| LOG_UNKNOWN_SOURCE.to_string());

        let mut fields: Vec<LogField> = properties
            .into_iter()
            .map(|(key, value)| LogField {
                key,
                value: value.into(),
            })
            .collect();
        if let Some(exception) = event.exception {
            fields.push(LogField {
                key: "Exception".to_string(),
                value: FieldValue::Text(exception),
            });
        }

        Self {
            id: Uuid::new_v4().to_string(),
            source,
            date: date.to_string(),
            timestamp: event.timestamp,
            level: event
                .level
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            message_template: event.message_template,
            message: event.rendered_message,
            fields,
        }
    }
}

impl RawPayload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>, date: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: LOG_UNKNOWN_SOURCE.to_string(),
            date: date.to_string(),
            received_at: Utc::now(),
            content_type,
            bytes,
        }
    }
}

/// Decode a submitted body into records.
///
/// A body matching the batch schema yields one event per entry; anything
/// else yields a single raw record.
pub fn records_from_body(body: &[u8], content_type: Option<&str>, date: &str) -> Vec<LogRecord> {
    match serde_json::from_slice::<SubmitBatch>(body) {
        Ok(batch) => batch
            .events
            .into_iter()
            .map(|e| LogRecord::Event(LogEvent::from_submitted(e, date)))
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, len = body.len(), "Body is not a log batch, storing raw");
            vec![LogRecord::Raw(RawPayload::new(
                body.to_vec(),
                content_type.map(String::from),
                date,
            ))]
        }
    }
}

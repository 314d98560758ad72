//! Wire models for the Issue API and Table Storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Length of a hex-encoded issue id
pub const ISSUE_ID_LENGTH: usize = 24;

pub fn is_valid_issue_id(id: &str) -> bool {
    id.len() == ISSUE_ID_LENGTH && id.chars().all(|c| c.is_ascii_hexdigit())
}

mod base64_bytes_opt {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .filter(|s| !s.is_empty())
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUser {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub poster_user_id: Option<String>,
    #[serde(default)]
    pub poster_display_name: Option<String>,
    #[serde(default)]
    pub message_content: Option<String>,
    #[serde(default)]
    pub post_date: Option<DateTime<Utc>>,
}

/// Bug report as served by the Issue API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub expected_results: Option<String>,
    #[serde(default)]
    pub actual_results: Option<String>,
    #[serde(default)]
    pub steps_to_reproduce: Option<String>,
    #[serde(default)]
    pub resolve_status: Option<String>,
    #[serde(default, with = "base64_bytes_opt")]
    pub image: Option<Vec<u8>>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub original_author: Option<IssueUser>,
    #[serde(default)]
    pub assigned_to: Option<IssueUser>,
}

/// Dashboard metrics of one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardKpi {
    pub daily_new_count: u64,
    pub daily_closed_count: u64,
    pub daily_in_progress_count: u64,

    pub monthly_chart_x_labels: Vec<String>,
    pub monthly_category_labels: Vec<String>,
    pub monthly_category_values: Vec<Vec<u64>>,

    pub lifelong_total: u64,
    pub lifelong_closed: u64,
    pub lifelong_in_progress: u64,
    pub lifelong_category_labels: Vec<String>,
    pub lifelong_category_values: Vec<u64>,
    pub lifelong_resolve_status_labels: Vec<String>,
    pub lifelong_resolve_status_values: Vec<u64>,
}

/// Table Storage entity holding a user note.
///
/// Properties other than the keys and timestamp stay in `fields`, in the
/// order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "PartitionKey", default)]
    pub partition_key: String,
    #[serde(rename = "RowKey", default)]
    pub row_key: String,
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Note {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Both keys are present
    pub fn has_keys(&self) -> bool {
        !self.partition_key.is_empty() && !self.row_key.is_empty()
    }

    /// Drop `odata.*` annotations such as the etag
    pub(crate) fn strip_annotations(&mut self) {
        self.fields.retain(|name, _| !name.starts_with("odata."));
    }
}

/// Query response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct NoteCollection {
    #[serde(default)]
    pub value: Vec<Note>,
}

/// `{"odata.error": {"code", "message": {"lang", "value"}}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ODataError {
    #[serde(rename = "odata.error")]
    pub error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: ODataErrorMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataErrorMessage {
    #[serde(default)]
    pub value: String,
}

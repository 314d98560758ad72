//! Issue API model
//!
//! JSON shape of an issue as exchanged with clients. Storage uses its own
//! record type (see `data::issues::record`).

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Length of a hex-encoded MongoDB ObjectId
pub const ISSUE_ID_LENGTH: usize = 24;

/// Check an id against `^[a-f\d]{24}$` (case-insensitive)
pub fn is_valid_issue_id(id: &str) -> bool {
    id.len() == ISSUE_ID_LENGTH && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Current UTC time truncated to the minute, used for submission/update stamps
pub fn issue_timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::minutes(1)).unwrap_or(now)
}

/// A user referenced by an issue (author or assignee)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueUser {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A comment posted on an issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub poster_user_id: Option<String>,
    #[serde(default)]
    pub poster_display_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 256, message = "messageContent must be at most 256 characters"))]
    pub message_content: Option<String>,
    #[serde(default)]
    pub post_date: Option<DateTime<Utc>>,
}

/// Bug report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "project must be at most 50 characters"))]
    pub project: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "team must be at most 50 characters"))]
    pub team: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100, message = "product must be at most 100 characters"))]
    pub product: Option<String>,

    #[serde(default)]
    #[validate(length(max = 25, message = "platform must be at most 25 characters"))]
    pub platform: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "category is required"),
        length(max = 50, message = "category must be at most 50 characters")
    )]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "version must be at most 50 characters"))]
    pub version: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "expectedResults is required"),
        length(max = 2000, message = "expectedResults must be at most 2000 characters")
    )]
    pub expected_results: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "actualResults is required"),
        length(max = 2000, message = "actualResults must be at most 2000 characters")
    )]
    pub actual_results: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "stepsToReproduce is required"),
        length(max = 2000, message = "stepsToReproduce must be at most 2000 characters")
    )]
    pub steps_to_reproduce: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "resolveStatus must be at most 50 characters"))]
    pub resolve_status: Option<String>,

    /// Screenshot bytes, base64 in JSON
    #[serde(default, with = "crate::utils::encoding::base64_bytes_opt")]
    pub image: Option<Vec<u8>>,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(nested)]
    pub messages: Vec<Message>,

    #[serde(default)]
    #[validate(required(message = "originalAuthor is required"))]
    pub original_author: Option<IssueUser>,

    #[serde(default)]
    #[validate(required(message = "assignedTo is required"))]
    pub assigned_to: Option<IssueUser>,
}

//! MongoDB document shape for issues
//!
//! Field names are PascalCase so that capitalized filter properties from the
//! search parser address stored fields directly.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Issue, IssueUser, Message};

fn to_bson_date(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(value.timestamp_millis())
}

fn from_bson_date(value: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value.timestamp_millis())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueUserRecord {
    #[serde(rename = "UserID", default)]
    pub user_id: Option<String>,
    #[serde(rename = "DisplayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<BsonDateTime>,
}

impl From<IssueUser> for IssueUserRecord {
    fn from(user: IssueUser) -> Self {
        Self {
            user_id: user.user_id,
            display_name: user.display_name,
            date: user.date.map(to_bson_date),
        }
    }
}

impl From<IssueUserRecord> for IssueUser {
    fn from(record: IssueUserRecord) -> Self {
        Self {
            user_id: record.user_id,
            display_name: record.display_name,
            date: record.date.and_then(from_bson_date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "PosterUserID", default)]
    pub poster_user_id: Option<String>,
    #[serde(rename = "PosterDisplayName", default)]
    pub poster_display_name: Option<String>,
    #[serde(rename = "MessageContent", default)]
    pub message_content: Option<String>,
    #[serde(rename = "PostDate", default)]
    pub post_date: Option<BsonDateTime>,
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        Self {
            poster_user_id: message.poster_user_id,
            poster_display_name: message.poster_display_name,
            message_content: message.message_content,
            post_date: message.post_date.map(to_bson_date),
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            poster_user_id: record.poster_user_id,
            poster_display_name: record.poster_display_name,
            message_content: record.message_content,
            post_date: record.post_date.and_then(from_bson_date),
        }
    }
}

/// Stored issue document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssueRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
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
    #[serde(default)]
    pub image: Option<Binary>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub submission_date: Option<BsonDateTime>,
    #[serde(default)]
    pub updated_date: Option<BsonDateTime>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(default)]
    pub original_author: Option<IssueUserRecord>,
    #[serde(default)]
    pub assigned_to: Option<IssueUserRecord>,
}

impl IssueRecord {
    /// Build a record for `id`; any id carried by the issue itself is ignored
    pub fn from_issue(id: ObjectId, issue: Issue) -> Self {
        Self {
            id,
            project: issue.project,
            team: issue.team,
            product: issue.product,
            platform: issue.platform,
            category: issue.category,
            version: issue.version,
            expected_results: issue.expected_results,
            actual_results: issue.actual_results,
            steps_to_reproduce: issue.steps_to_reproduce,
            resolve_status: issue.resolve_status,
            image: issue.image.map(|bytes| Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }),
            content_type: issue.content_type,
            submission_date: issue.submission_date.map(to_bson_date),
            updated_date: issue.updated_date.map(to_bson_date),
            messages: issue.messages.into_iter().map(Into::into).collect(),
            original_author: issue.original_author.map(Into::into),
            assigned_to: issue.assigned_to.map(Into::into),
        }
    }

    pub fn into_issue(self) -> Issue {
        Issue {
            id: Some(self.id.to_hex()),
            project: self.project,
            team: self.team,
            product: self.product,
            platform: self.platform,
            category: self.category,
            version: self.version,
            expected_results: self.expected_results,
            actual_results: self.actual_results,
            steps_to_reproduce: self.steps_to_reproduce,
            resolve_status: self.resolve_status,
            image: self.image.map(|b| b.bytes),
            content_type: self.content_type,
            submission_date: self.submission_date.and_then(from_bson_date),
            updated_date: self.updated_date.and_then(from_bson_date),
            messages: self.messages.into_iter().map(Into::into).collect(),
            original_author: self.original_author.map(Into::into),
            assigned_to: self.assigned_to.map(Into::into),
        }
    }

    /// UTC calendar day of submission
    pub fn submission_day(&self) -> Option<chrono::NaiveDate> {
        self.submission_date
            .and_then(from_bson_date)
            .map(|d| d.date_naive())
    }
}

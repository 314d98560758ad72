//! MongoDB-backed issue store

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, DateTime as BsonDateTime, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use super::record::IssueRecord;
use super::{IssueRepository, StoreHealth};
use crate::core::config::DatabaseConfig;
use crate::core::constants::{
    APP_NAME, MONGO_SERVER_SELECTION_TIMEOUT_SECS, STATUS_CLOSED, STATUS_NEW,
};
use crate::data::error::DataError;
use crate::data::query::{Query, to_mongo_filter};
use crate::domain::metrics::{self, DashboardKpi};
use crate::domain::Issue;

const FIELD_ID: &str = "_id";
const FIELD_PROJECT: &str = "Project";
const FIELD_CATEGORY: &str = "Category";
const FIELD_RESOLVE_STATUS: &str = "ResolveStatus";
const FIELD_SUBMISSION_DATE: &str = "SubmissionDate";

/// Fields covered by the `$text` index used for keyword search
const TEXT_INDEX_FIELDS: &[&str] = &[
    "ExpectedResults",
    "ActualResults",
    "StepsToReproduce",
    "Product",
    "Category",
];

fn parse_object_id(id: &str) -> Result<ObjectId, DataError> {
    ObjectId::parse_str(id).map_err(|_| DataError::InvalidId(id.to_string()))
}

fn day_start(day: NaiveDate) -> BsonDateTime {
    BsonDateTime::from_millis(day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Every issue of a project, optionally narrowed to one resolve status
fn lifelong_filter(project: &str, status: Option<&str>) -> Document {
    let mut filter = doc! { FIELD_PROJECT: project };
    if let Some(status) = status {
        filter.insert(FIELD_RESOLVE_STATUS, status);
    }
    filter
}

/// Issues submitted since the start of yesterday (UTC)
fn daily_filter(project: &str, today: NaiveDate, status: Option<&str>) -> Document {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let mut filter = doc! {
        FIELD_PROJECT: project,
        FIELD_SUBMISSION_DATE: { "$gte": day_start(yesterday) },
    };
    if let Some(status) = status {
        filter.insert(FIELD_RESOLVE_STATUS, status);
    }
    filter
}

/// Issues submitted in `[today - 30, today)`
fn monthly_filter(project: &str, today: NaiveDate) -> Document {
    doc! {
        FIELD_PROJECT: project,
        FIELD_SUBMISSION_DATE: {
            "$gte": day_start(metrics::monthly_window_start(today)),
            "$lt": day_start(today),
        },
    }
}

/// Issues of a project whose `field` holds one distinct value; a missing or
/// empty value matches documents without the field
fn breakdown_filter(project: &str, field: &str, value: Bson) -> Document {
    let matcher = match value {
        Bson::String(s) if !s.is_empty() => Bson::String(s),
        _ => Bson::Null,
    };
    doc! { FIELD_PROJECT: project, field: matcher }
}

pub struct MongoIssueStore {
    database: Database,
    issues: Collection<IssueRecord>,
}

impl MongoIssueStore {
    /// Build the client. The driver connects lazily, so an unreachable
    /// server surfaces on the first operation rather than here.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataError> {
        if config.database_name.trim().is_empty() {
            return Err(DataError::Config("database name is empty".to_string()));
        }
        if config.issue_collection.trim().is_empty() {
            return Err(DataError::Config("issue collection is empty".to_string()));
        }

        let mut options = ClientOptions::parse(&config.connection_string).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout =
            Some(Duration::from_secs(MONGO_SERVER_SELECTION_TIMEOUT_SECS));

        let client = Client::with_options(options)?;
        let database = client.database(&config.database_name);
        let issues = database.collection::<IssueRecord>(&config.issue_collection);

        tracing::debug!(
            database = %config.database_name,
            collection = %config.issue_collection,
            "MongoDB client initialized"
        );

        Ok(Self { database, issues })
    }

    /// Create the text index backing keyword search
    pub async fn ensure_indexes(&self) -> Result<(), DataError> {
        let mut keys = Document::new();
        for field in TEXT_INDEX_FIELDS {
            keys.insert(*field, "text");
        }
        self.issues
            .create_index(IndexModel::builder().keys(keys).build())
            .await?;
        tracing::debug!("Issue text index ensured");
        Ok(())
    }

    async fn find(&self, filter: Document) -> Result<Vec<Issue>, DataError> {
        let cursor = self.issues.find(filter).await?;
        let records: Vec<IssueRecord> = cursor.try_collect().await?;
        Ok(records.into_iter().map(IssueRecord::into_issue).collect())
    }

    async fn count(&self, filter: Document) -> Result<u64, DataError> {
        Ok(self.issues.count_documents(filter).await?)
    }

    /// Count of records per distinct value of `field` within a project
    async fn breakdown(&self, project: &str, field: &str) -> Result<(Vec<String>, Vec<u64>), DataError> {
        let values = self
            .issues
            .distinct(field, doc! { FIELD_PROJECT: project })
            .await?;

        let mut labels = Vec::with_capacity(values.len());
        let mut counts = Vec::with_capacity(values.len());
        for value in values {
            let label = metrics::breakdown_label(value.as_str());
            let count = self.count(breakdown_filter(project, field, value)).await?;
            labels.push(label);
            counts.push(count);
        }
        Ok((labels, counts))
    }
}

#[async_trait]
impl IssueRepository for MongoIssueStore {
    async fn find_all(&self) -> Result<Vec<Issue>, DataError> {
        self.find(doc! {}).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Issue>, DataError> {
        let oid = parse_object_id(id)?;
        let record = self.issues.find_one(doc! { FIELD_ID: oid }).await?;
        Ok(record.map(IssueRecord::into_issue))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Issue>, DataError> {
        let oids = ids
            .iter()
            .map(|id| parse_object_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        self.find(doc! { FIELD_ID: { "$in": oids } }).await
    }

    async fn search(&self, query: &Query) -> Result<Vec<Issue>, DataError> {
        let filter = to_mongo_filter(query)?;
        self.find(filter).await
    }

    async fn insert(&self, issue: Issue) -> Result<String, DataError> {
        let id = ObjectId::new();
        self.issues
            .insert_one(IssueRecord::from_issue(id, issue))
            .await?;
        tracing::debug!(id = %id, "Issue inserted");
        Ok(id.to_hex())
    }

    async fn replace(&self, id: &str, issue: Issue) -> Result<bool, DataError> {
        let oid = parse_object_id(id)?;
        let result = self
            .issues
            .replace_one(doc! { FIELD_ID: oid }, IssueRecord::from_issue(oid, issue))
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DataError> {
        let oid = parse_object_id(id)?;
        let result = self.issues.delete_one(doc! { FIELD_ID: oid }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn metrics(&self, project: &str, today: NaiveDate) -> Result<DashboardKpi, DataError> {
        let mut kpi = DashboardKpi::default();

        // Lifelong
        kpi.lifelong_total = self.count(lifelong_filter(project, None)).await?;
        kpi.lifelong_closed = self
            .count(lifelong_filter(project, Some(STATUS_CLOSED)))
            .await?;
        let lifelong_new = self.count(lifelong_filter(project, Some(STATUS_NEW))).await?;
        kpi.lifelong_in_progress =
            metrics::in_progress(kpi.lifelong_total, lifelong_new, kpi.lifelong_closed);

        let (labels, values) = self.breakdown(project, FIELD_CATEGORY).await?;
        kpi.lifelong_category_labels = labels;
        kpi.lifelong_category_values = values;

        let (labels, values) = self.breakdown(project, FIELD_RESOLVE_STATUS).await?;
        kpi.lifelong_resolve_status_labels = labels;
        kpi.lifelong_resolve_status_values = values;

        // Monthly
        let records: Vec<IssueRecord> = self
            .issues
            .find(monthly_filter(project, today))
            .await?
            .try_collect()
            .await?;
        let monthly = metrics::monthly_breakdown(
            today,
            records
                .iter()
                .filter_map(|r| r.submission_day().map(|day| (r.category.as_deref(), day))),
        );
        kpi.monthly_chart_x_labels = monthly.x_labels;
        kpi.monthly_category_labels = monthly.categories;
        kpi.monthly_category_values = monthly.values;

        // Daily
        let daily_total = self.count(daily_filter(project, today, None)).await?;
        kpi.daily_new_count = self
            .count(daily_filter(project, today, Some(STATUS_NEW)))
            .await?;
        kpi.daily_closed_count = self
            .count(daily_filter(project, today, Some(STATUS_CLOSED)))
            .await?;
        kpi.daily_in_progress_count =
            metrics::in_progress(daily_total, kpi.daily_new_count, kpi.daily_closed_count);

        tracing::debug!(project, total = kpi.lifelong_total, "Computed dashboard metrics");
        Ok(kpi)
    }

    async fn health(&self) -> Result<StoreHealth, DataError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        let record_count = self.issues.estimated_document_count().await?;
        let sample_read = if record_count > 0 {
            self.issues.find_one(doc! {}).await?.is_some()
        } else {
            false
        };
        Ok(StoreHealth {
            record_count,
            sample_read,
        })
    }
}

//! In-memory issue store for route tests

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use mongodb::bson::oid::ObjectId;
use parking_lot::Mutex;

use super::{IssueRepository, StoreHealth};
use crate::core::constants::{STATUS_CLOSED, STATUS_NEW};
use crate::data::error::DataError;
use crate::data::query::{ComparisonOperator, MongoClause, Query, to_mongo_filter};
use crate::domain::metrics::{self, DashboardKpi};
use crate::domain::Issue;

/// Keeps issues in insertion order. Search supports plain equality and
/// inequality clauses on top-level string fields.
#[derive(Default)]
pub struct MemoryIssueStore {
    issues: Mutex<Vec<Issue>>,
    unavailable: bool,
}

impl MemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails like an unreachable database
    pub fn unavailable() -> Self {
        Self {
            issues: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    fn check(&self) -> Result<(), DataError> {
        if self.unavailable {
            return Err(DataError::Config("store unavailable".to_string()));
        }
        Ok(())
    }

    fn field(issue: &Issue, property: &str) -> Option<String> {
        let value = serde_json::to_value(issue).ok()?;
        let mut chars = property.chars();
        let key: String = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => return None,
        };
        value.get(&key)?.as_str().map(String::from)
    }

    fn matches(issue: &Issue, clause: &MongoClause) -> bool {
        match clause {
            MongoClause::Compare {
                field,
                operator,
                value,
            } => {
                let actual = Self::field(issue, field);
                match operator {
                    ComparisonOperator::Eq => actual.as_deref() == Some(value.as_str()),
                    ComparisonOperator::Ne => actual.as_deref() != Some(value.as_str()),
                    _ => false,
                }
            }
            MongoClause::NotNull { field } => Self::field(issue, field).is_some(),
            MongoClause::ObjectIdCompare { id, .. } => issue.id.as_deref() == Some(&id.to_hex()),
            MongoClause::TextSearch(_) | MongoClause::Limit(_) => true,
        }
    }

    fn has_status(issue: &Issue, status: &str) -> bool {
        issue.resolve_status.as_deref() == Some(status)
    }

    fn submitted_on(issue: &Issue) -> Option<NaiveDate> {
        issue.submission_date.map(|d| d.date_naive())
    }

    /// Distinct-value counts in first-seen order
    fn breakdown<'a>(values: impl Iterator<Item = Option<&'a str>>) -> (Vec<String>, Vec<u64>) {
        let mut labels: Vec<String> = Vec::new();
        let mut counts: Vec<u64> = Vec::new();
        for value in values {
            let label = metrics::breakdown_label(value);
            match labels.iter().position(|l| *l == label) {
                Some(index) => counts[index] += 1,
                None => {
                    labels.push(label);
                    counts.push(1);
                }
            }
        }
        (labels, counts)
    }
}

#[async_trait]
impl IssueRepository for MemoryIssueStore {
    async fn find_all(&self) -> Result<Vec<Issue>, DataError> {
        self.check()?;
        Ok(self.issues.lock().clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Issue>, DataError> {
        self.check()?;
        Ok(self
            .issues
            .lock()
            .iter()
            .find(|i| i.id.as_deref() == Some(id))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Issue>, DataError> {
        self.check()?;
        Ok(self
            .issues
            .lock()
            .iter()
            .filter(|i| i.id.as_ref().is_some_and(|id| ids.contains(id)))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &Query) -> Result<Vec<Issue>, DataError> {
        self.check()?;
        // Same rejections as the Mongo store
        to_mongo_filter(query)?;
        let clauses = query
            .filters
            .iter()
            .map(MongoClause::from_filter)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .issues
            .lock()
            .iter()
            .filter(|issue| clauses.iter().all(|c| Self::matches(issue, c)))
            .cloned()
            .collect())
    }

    async fn insert(&self, mut issue: Issue) -> Result<String, DataError> {
        self.check()?;
        let id = ObjectId::new().to_hex();
        issue.id = Some(id.clone());
        self.issues.lock().push(issue);
        Ok(id)
    }

    async fn replace(&self, id: &str, mut issue: Issue) -> Result<bool, DataError> {
        self.check()?;
        let mut issues = self.issues.lock();
        match issues.iter_mut().find(|i| i.id.as_deref() == Some(id)) {
            Some(existing) => {
                issue.id = Some(id.to_string());
                *existing = issue;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, DataError> {
        self.check()?;
        let mut issues = self.issues.lock();
        let before = issues.len();
        issues.retain(|i| i.id.as_deref() != Some(id));
        Ok(issues.len() < before)
    }

    async fn metrics(&self, project: &str, today: NaiveDate) -> Result<DashboardKpi, DataError> {
        self.check()?;
        let issues: Vec<Issue> = self
            .issues
            .lock()
            .iter()
            .filter(|i| i.project.as_deref() == Some(project))
            .cloned()
            .collect();
        let count = |items: &[&Issue], status: &str| {
            items.iter().filter(|i| Self::has_status(i, status)).count() as u64
        };
        let all: Vec<&Issue> = issues.iter().collect();

        let mut kpi = DashboardKpi {
            lifelong_total: all.len() as u64,
            lifelong_closed: count(&all, STATUS_CLOSED),
            ..Default::default()
        };
        kpi.lifelong_in_progress =
            metrics::in_progress(kpi.lifelong_total, count(&all, STATUS_NEW), kpi.lifelong_closed);
        (kpi.lifelong_category_labels, kpi.lifelong_category_values) =
            Self::breakdown(issues.iter().map(|i| i.category.as_deref()));
        (kpi.lifelong_resolve_status_labels, kpi.lifelong_resolve_status_values) =
            Self::breakdown(issues.iter().map(|i| i.resolve_status.as_deref()));

        let start = metrics::monthly_window_start(today);
        let monthly = metrics::monthly_breakdown(
            today,
            issues.iter().filter_map(|i| {
                let day = Self::submitted_on(i)?;
                (day >= start && day < today).then_some((i.category.as_deref(), day))
            }),
        );
        kpi.monthly_chart_x_labels = monthly.x_labels;
        kpi.monthly_category_labels = monthly.categories;
        kpi.monthly_category_values = monthly.values;

        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let daily: Vec<&Issue> = issues
            .iter()
            .filter(|i| Self::submitted_on(i).is_some_and(|day| day >= yesterday))
            .collect();
        kpi.daily_new_count = count(&daily, STATUS_NEW);
        kpi.daily_closed_count = count(&daily, STATUS_CLOSED);
        kpi.daily_in_progress_count =
            metrics::in_progress(daily.len() as u64, kpi.daily_new_count, kpi.daily_closed_count);
        Ok(kpi)
    }

    async fn health(&self) -> Result<StoreHealth, DataError> {
        self.check()?;
        let record_count = self.issues.lock().len() as u64;
        Ok(StoreHealth {
            record_count,
            sample_read: record_count > 0,
        })
    }
}

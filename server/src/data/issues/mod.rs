//! Issue storage
//!
//! [`IssueRepository`] is the seam between the HTTP routes and the backing
//! store. [`MongoIssueStore`] is the production implementation.

#[cfg(test)]
pub mod memory;
mod mongo;
pub mod record;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::data::error::DataError;
use crate::data::query::Query;
use crate::domain::{DashboardKpi, Issue};

pub use mongo::MongoIssueStore;

/// Result of a readiness probe against the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreHealth {
    pub record_count: u64,
    /// Whether a sample record was read back (only attempted when records exist)
    pub sample_read: bool,
}

/// Repository trait for issue CRUD, search and metrics
#[async_trait]
pub trait IssueRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Issue>, DataError>;

    /// `None` when no issue has this id
    async fn find_by_id(&self, id: &str) -> Result<Option<Issue>, DataError>;

    /// Issues for every id that exists; missing ids are skipped
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Issue>, DataError>;

    /// Issues matching a parsed search query
    async fn search(&self, query: &Query) -> Result<Vec<Issue>, DataError>;

    /// Store a new issue and return its generated id
    async fn insert(&self, issue: Issue) -> Result<String, DataError>;

    /// Replace an existing issue; `false` when nothing matched
    async fn replace(&self, id: &str, issue: Issue) -> Result<bool, DataError>;

    /// Delete an issue; `false` when nothing matched
    async fn delete(&self, id: &str) -> Result<bool, DataError>;

    /// Dashboard metrics for one project as of `today` (UTC)
    async fn metrics(&self, project: &str, today: NaiveDate) -> Result<DashboardKpi, DataError>;

    /// Ping the store and read one record if any exist
    async fn health(&self) -> Result<StoreHealth, DataError>;
}

//! Data layer: issue storage, search query translation, log files

pub mod error;
pub mod issues;
pub mod logs;
pub mod query;

pub use error::DataError;
pub use issues::{IssueRepository, MongoIssueStore};
pub use logs::LogService;

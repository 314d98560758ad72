//! Domain models shared by the API and data layers

pub mod issues;
pub mod metrics;

pub use issues::{Issue, IssueUser, Message, is_valid_issue_id};
pub use metrics::DashboardKpi;

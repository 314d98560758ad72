//! # Safari client
//!
//! Typed HTTP clients for the SafariBugTracker services:
//!
//! - [`IssueClient`] talks to the Issue API (`/api/issues`, `/api/metrics`)
//!   with the shared API key in the `Authorization` header.
//! - [`NoteClient`] stores user notes in Azure Table Storage over its OData
//!   REST interface, authenticated with a SAS token.
//! - [`QueryBuilder`] renders OData-style query strings, and
//!   [`IssueSearchParameters`] maps a search form onto one.
//!
//! Every repository call returns a [`RepositoryError`] on failure whose
//! [`ErrorCategory`] tells the caller how to present it.
//!
//! ```no_run
//! use safari_client::{IssueClient, IssueRepository, IssueSearchParameters};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IssueClient::new("http://localhost:5005/api/", "secret")?;
//! let params = IssueSearchParameters {
//!     project: Some("Safari".to_string()),
//!     ..Default::default()
//! };
//! let issues = client.query_issues(&params.to_query_string()).await?;
//! println!("{} issues", issues.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod image;
pub mod issues;
pub mod models;
pub mod notes;
pub mod odata;
pub mod search;

pub use error::{ClientError, ErrorCategory, RepositoryError};
pub use http::{HttpService, MediaType};
pub use image::{ImageError, ImageUpload, ImageValidator};
pub use issues::{IssueClient, IssueRepository};
pub use models::{DashboardKpi, Issue, IssueUser, Message, Note};
pub use notes::{NoteClient, NoteSettings};
pub use odata::{ODataFilter, ODataOperator, QueryBuilder, table_filter};
pub use search::{IssueSearchParameters, RangeSearch};

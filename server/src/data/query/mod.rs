//! Issue search query system
//!
//! Parses OData-like filter strings into typed filters and translates them
//! into MongoDB filter documents.
//!
//! ## Usage
//!
//! ```no_run
//! use safari_server::data::query::{parse_query, to_mongo_filter};
//!
//! let query = parse_query("project eq 'Safari' and resolveStatus eq 'All'").unwrap();
//! let filter = to_mongo_filter(&query).unwrap();
//! ```

mod error;
mod mongo;
mod parser;
mod types;

pub use error::QueryError;
pub use mongo::{MongoClause, to_mongo_filter};
pub use parser::{parse_filters, parse_query, parse_top};
pub use types::{ComparisonOperator, Query, QueryFilter};

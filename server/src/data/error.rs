//! Error type for the data layer

use thiserror::Error;

use crate::data::query::QueryError;

/// Errors from issue storage operations
#[derive(Error, Debug)]
pub enum DataError {
    /// MongoDB driver error (connection, command, or (de)serialization)
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Search query could not be translated
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Id is not a 24 character hex ObjectId
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

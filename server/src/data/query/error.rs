use thiserror::Error;

/// Errors raised while parsing or translating a search query.
///
/// Messages are returned to API callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Request Parameter: filter was poorly formed")]
    InvalidFilter,

    #[error("Request Parameter: top was poorly formed")]
    InvalidTop,

    #[error("Request Parameter: {0} is not a valid id")]
    InvalidId(String),

    #[error("Request Parameter: filter repeats {0}")]
    DuplicateKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        assert_eq!(
            QueryError::InvalidFilter.to_string(),
            "Request Parameter: filter was poorly formed"
        );
        assert_eq!(
            QueryError::InvalidTop.to_string(),
            "Request Parameter: top was poorly formed"
        );
        assert_eq!(
            QueryError::InvalidId("xyz".to_string()).to_string(),
            "Request Parameter: xyz is not a valid id"
        );
        assert_eq!(
            QueryError::DuplicateKey("Project".to_string()).to_string(),
            "Request Parameter: filter repeats Project"
        );
    }
}

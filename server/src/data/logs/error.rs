//! Log service error types

use thiserror::Error;

/// Errors from log ingestion, encoding and file writers
#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Malformed log record: {0}")]
    Malformed(String),

    #[error("Log writer for {0} is closed")]
    WriterClosed(String),

    #[error("Log service is shut down")]
    ShutDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_closed_display() {
        let err = LogError::WriterClosed("logs/app/log.json".to_string());
        assert_eq!(err.to_string(), "Log writer for logs/app/log.json is closed");
    }

    #[test]
    fn test_malformed_display() {
        let err = LogError::Malformed("missing Kind".to_string());
        assert_eq!(err.to_string(), "Malformed log record: missing Kind");
    }
}

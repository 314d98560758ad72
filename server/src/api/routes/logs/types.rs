//! Logger API types

use serde::Deserialize;

/// Query string of the submit endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    #[serde(default)]
    pub authcode: Option<String>,
}

/// Returned when a batch has been stored
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Submit Successful";

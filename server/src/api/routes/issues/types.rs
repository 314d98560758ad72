//! Issue API types

use serde::Deserialize;

use crate::data::query::{Query, QueryError, parse_query};

/// Query string of the search endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Filter expression, e.g. `project eq 'Safari' and category eq 'UI'`.
    /// May carry a `?top=N` marker.
    #[serde(default)]
    pub filter: Option<String>,

    /// Result limit, used when the filter carries no `?top=` marker
    #[serde(default)]
    pub top: Option<String>,
}

impl SearchParams {
    /// `None` when neither a filter nor a limit was given
    pub fn into_query(self) -> Result<Option<Query>, QueryError> {
        let filter = self.filter.unwrap_or_default();
        let top = self.top.filter(|t| !t.is_empty());
        if filter.trim().is_empty() && top.is_none() {
            return Ok(None);
        }

        let mut query = parse_query(&filter)?;
        if query.top.is_none()
            && let Some(top) = top
        {
            if !top.chars().all(|c| c.is_ascii_digit()) {
                return Err(QueryError::InvalidTop);
            }
            query.top = Some(top);
        }
        Ok(Some(query))
    }
}

/// Success message for a write on one issue
pub fn resource_message(id: &str, action: &str) -> String {
    format!("Resource: {} {} successfully", id, action)
}

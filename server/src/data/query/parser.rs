//! Filter string parsing
//!
//! Extracts `property op 'value'` clauses and the optional `?top=N` marker
//! from a raw search string.

use std::sync::OnceLock;

use regex::Regex;

use crate::utils::string::capitalize_first;

use super::error::QueryError;
use super::types::{ComparisonOperator, Query, QueryFilter};

static FILTER_CLAUSE_REGEX: OnceLock<Regex> = OnceLock::new();
static TOP_PARAMETER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Property (letters), two-letter operator, single-quoted value
fn filter_clause_regex() -> &'static Regex {
    FILTER_CLAUSE_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)([A-Za-z]+)\s([A-Za-z]{2})\s'([A-Za-z0-9_&*.,'"()!`~-]+)'"#)
            .expect("invalid filter clause regex")
    })
}

fn top_parameter_regex() -> &'static Regex {
    TOP_PARAMETER_REGEX
        .get_or_init(|| Regex::new(r"\?top=(\d*)").expect("invalid top parameter regex"))
}

const TOP_MARKER: &str = "?top=";

/// Parse every filter clause in `raw`, in order of appearance.
///
/// Fails on the first clause whose operator is not a comparison operator;
/// no partial list is returned.
pub fn parse_filters(raw: &str) -> Result<Vec<QueryFilter>, QueryError> {
    filter_clause_regex()
        .captures_iter(raw)
        .map(|caps| {
            let operator: ComparisonOperator = caps[2].parse()?;
            QueryFilter::new(capitalize_first(&caps[1]), operator, &caps[3])
        })
        .collect()
}

/// Extract the `?top=` value.
///
/// `None` when the marker is absent, an error when it carries no digits.
pub fn parse_top(raw: &str) -> Result<Option<String>, QueryError> {
    if !raw.contains(TOP_MARKER) {
        return Ok(None);
    }
    let digits = top_parameter_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    if digits.is_empty() {
        return Err(QueryError::InvalidTop);
    }
    Ok(Some(digits.to_string()))
}

/// Parse filters and top together
pub fn parse_query(raw: &str) -> Result<Query, QueryError> {
    let filters = parse_filters(raw)?;
    let top = parse_top(raw)?;
    tracing::debug!(filters = filters.len(), top = ?top, "Parsed search query");
    Ok(Query {
        filters,
        top,
        select: None,
    })
}

//! OData query strings
//!
//! Clauses render as `{property}%20{op}%20'{value}'` and are joined with
//! `%20and%20`. Values are inserted verbatim.

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

const WHITESPACE: &str = "%20";
const AND: &str = "%20and%20";

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ODataOperator {
    #[default]
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
    /// Between
    Be,
}

impl ODataOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Ne => "ne",
            Self::Be => "be",
        }
    }
}

impl fmt::Display for ODataOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ODataOperator {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "ge" => Ok(Self::Ge),
            "lt" => Ok(Self::Lt),
            "le" => Ok(Self::Le),
            "ne" => Ok(Self::Ne),
            "be" => Ok(Self::Be),
            other => Err(ClientError::InvalidFilter(format!("unknown operator {other}"))),
        }
    }
}

/// One `property op 'value'` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ODataFilter {
    property: String,
    operator: ODataOperator,
    value: String,
}

impl ODataFilter {
    pub fn new(
        property: impl Into<String>,
        operator: ODataOperator,
        value: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let property = property.into();
        let value = value.into();
        if property.is_empty() {
            return Err(ClientError::InvalidFilter("property is empty".to_string()));
        }
        if value.is_empty() {
            return Err(ClientError::InvalidFilter(format!("{property} has no value")));
        }
        Ok(Self {
            property,
            operator,
            value,
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operator(&self) -> ODataOperator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn clause(&self) -> String {
        format!(
            "{}{WHITESPACE}{}{WHITESPACE}'{}'",
            self.property, self.operator, self.value
        )
    }
}

fn join_clauses(filters: &[ODataFilter]) -> String {
    filters
        .iter()
        .map(ODataFilter::clause)
        .collect::<Vec<_>>()
        .join(AND)
}

/// Table Storage filter suffix: `&$filter=` followed by the clauses
pub fn table_filter(filters: &[ODataFilter]) -> String {
    format!("&$filter={}", join_clauses(filters))
}

/// Accumulates filter, top and select options for one query
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    filters: Vec<ODataFilter>,
    top: Option<String>,
    select: Option<Vec<String>>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause; an empty value means "not filtered" and is skipped
    pub fn add_filter(&mut self, property: &str, value: &str, operator: ODataOperator) -> &mut Self {
        if value.is_empty() {
            return self;
        }
        match ODataFilter::new(property, operator, value) {
            Ok(filter) => self.filters.push(filter),
            Err(e) => tracing::debug!(error = %e, "Skipping filter"),
        }
        self
    }

    pub fn add_top(&mut self, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.top = Some(value.to_string());
        }
        self
    }

    /// Recorded only; the rendered query does not include it
    pub fn select<I, S>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn filters(&self) -> &[ODataFilter] {
        &self.filters
    }

    pub fn top(&self) -> Option<&str> {
        self.top.as_deref()
    }

    pub fn selected(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    /// Render the query string.
    ///
    /// Empty when nothing was set. The top option is joined with a literal
    /// `&amp;`, e.g. `?filter=A%20eq%20'1'%20&amp;%20top=5`.
    pub fn build(&self) -> String {
        if self.filters.is_empty() && self.top.is_none() && self.select.is_none() {
            return String::new();
        }

        let mut query = String::from("?");
        if !self.filters.is_empty() {
            query.push_str("filter=");
            query.push_str(&join_clauses(&self.filters));
        }
        if let Some(top) = &self.top {
            query.push_str(&format!("{WHITESPACE}&amp;{WHITESPACE}top={top}"));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        assert_eq!(ODataOperator::Be.to_string(), "be");
        assert_eq!("ge".parse::<ODataOperator>().unwrap(), ODataOperator::Ge);
        assert!("xx".parse::<ODataOperator>().is_err());
    }

    #[test]
    fn test_filter_requires_property_and_value() {
        assert!(ODataFilter::new("", ODataOperator::Eq, "x").is_err());
        assert!(ODataFilter::new("Project", ODataOperator::Eq, "").is_err());
        let filter = ODataFilter::new("Project", ODataOperator::Ne, "Safari").unwrap();
        assert_eq!(filter.property(), "Project");
        assert_eq!(filter.operator(), ODataOperator::Ne);
        assert_eq!(filter.value(), "Safari");
    }

    #[test]
    fn test_empty_builder_renders_nothing() {
        let mut builder = QueryBuilder::new();
        builder
            .add_filter("project", "", ODataOperator::Eq)
            .add_top("");
        assert_eq!(builder.build(), "");
    }

    #[test]
    fn test_filters_and_top() {
        let mut builder = QueryBuilder::new();
        builder
            .add_filter("A", "1", ODataOperator::Eq)
            .add_filter("B", "2", ODataOperator::Gt)
            .add_top("5");
        assert_eq!(
            builder.build(),
            "?filter=A%20eq%20'1'%20and%20B%20gt%20'2'%20&amp;%20top=5"
        );
    }

    #[test]
    fn test_single_filter() {
        let mut builder = QueryBuilder::new();
        builder.add_filter("project", "Safari", ODataOperator::Eq);
        assert_eq!(builder.build(), "?filter=project%20eq%20'Safari'");
    }

    #[test]
    fn test_top_only() {
        let mut builder = QueryBuilder::new();
        builder.add_top("10");
        assert_eq!(builder.build(), "?%20&amp;%20top=10");
    }

    #[test]
    fn test_select_is_recorded_not_rendered() {
        let mut builder = QueryBuilder::new();
        builder.select(["Title", "Content"]);
        assert_eq!(
            builder.selected(),
            Some(&["Title".to_string(), "Content".to_string()][..])
        );
        assert_eq!(builder.build(), "?");
    }

    #[test]
    fn test_table_filter() {
        let filters = vec![
            ODataFilter::new("PartitionKey", ODataOperator::Eq, "user-1").unwrap(),
            ODataFilter::new("Title", ODataOperator::Ne, "Draft").unwrap(),
        ];
        assert_eq!(
            table_filter(&filters),
            "&$filter=PartitionKey%20eq%20'user-1'%20and%20Title%20ne%20'Draft'"
        );
    }
}

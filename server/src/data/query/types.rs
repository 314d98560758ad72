//! Query type definitions

use std::fmt;
use std::str::FromStr;

use super::error::QueryError;

/// Comparison operators accepted in filter clauses.
///
/// Tokens are matched case-sensitively: `eq` is valid, `EQ` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Ne => "ne",
        }
    }

    /// MongoDB query operator for this comparison
    pub fn mongo_operator(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Ge => "$gte",
            Self::Lt => "$lt",
            Self::Le => "$lte",
            Self::Ne => "$ne",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "ge" => Ok(Self::Ge),
            "lt" => Ok(Self::Lt),
            "le" => Ok(Self::Le),
            "ne" => Ok(Self::Ne),
            _ => Err(QueryError::InvalidFilter),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `property operator 'value'` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    property: String,
    operator: ComparisonOperator,
    value: String,
}

impl QueryFilter {
    /// Build a filter; property and value must be non-empty
    pub fn new(
        property: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let property = property.into();
        let value = value.into();
        if property.is_empty() || value.is_empty() {
            return Err(QueryError::InvalidFilter);
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

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// All query options parsed from one search request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<QueryFilter>,
    pub top: Option<String>,
    pub select: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_from_str() {
        for (token, op) in [
            ("eq", ComparisonOperator::Eq),
            ("gt", ComparisonOperator::Gt),
            ("ge", ComparisonOperator::Ge),
            ("lt", ComparisonOperator::Lt),
            ("le", ComparisonOperator::Le),
            ("ne", ComparisonOperator::Ne),
        ] {
            assert_eq!(token.parse::<ComparisonOperator>().unwrap(), op);
            assert_eq!(op.to_string(), token);
        }
    }

    #[test]
    fn test_operator_rejects_unknown_and_wrong_case() {
        assert_eq!(
            "be".parse::<ComparisonOperator>(),
            Err(QueryError::InvalidFilter)
        );
        assert_eq!(
            "EQ".parse::<ComparisonOperator>(),
            Err(QueryError::InvalidFilter)
        );
    }

    #[test]
    fn test_mongo_operator_names() {
        assert_eq!(ComparisonOperator::Ge.mongo_operator(), "$gte");
        assert_eq!(ComparisonOperator::Le.mongo_operator(), "$lte");
        assert_eq!(ComparisonOperator::Ne.mongo_operator(), "$ne");
    }

    #[test]
    fn test_filter_requires_property_and_value() {
        assert!(QueryFilter::new("", ComparisonOperator::Eq, "x").is_err());
        assert!(QueryFilter::new("Project", ComparisonOperator::Eq, "").is_err());
        let filter = QueryFilter::new("Project", ComparisonOperator::Eq, "Safari").unwrap();
        assert_eq!(filter.property(), "Project");
        assert_eq!(filter.value(), "Safari");
    }
}

//! MongoDB filter translation
//!
//! Each parsed filter becomes one typed [`MongoClause`]; clauses are folded
//! into an insertion-ordered BSON document using the driver's own types.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};

use super::error::QueryError;
use super::types::{ComparisonOperator, Query, QueryFilter};

/// Filter property compared against the document id
pub const ID_PROPERTY: &str = "Id";

/// Filter property mapped to full-text search
pub const KEYWORD_PROPERTY: &str = "Keyword";

/// Resolve status property; the value `All` matches any status
pub const RESOLVE_STATUS_PROPERTY: &str = "ResolveStatus";

const RESOLVE_STATUS_ALL: &str = "All";
const MONGO_ID_FIELD: &str = "_id";
const MONGO_TEXT_OPERATOR: &str = "$text";
const MONGO_LIMIT_KEY: &str = "$limit";

/// One top-level entry of a MongoDB filter document
#[derive(Debug, Clone, PartialEq)]
pub enum MongoClause {
    /// `{"_id": {"$op": ObjectId}}`
    ObjectIdCompare {
        operator: ComparisonOperator,
        id: ObjectId,
    },
    /// `{"$text": {"$search": terms}}`
    TextSearch(String),
    /// `{field: {"$ne": null}}`
    NotNull { field: String },
    /// `{field: {"$op": value}}`
    Compare {
        field: String,
        operator: ComparisonOperator,
        value: String,
    },
    /// `{"$limit": top}`; the server rejects this key inside a filter
    Limit(String),
}

impl MongoClause {
    /// Classify a parsed filter. Special properties take precedence in the
    /// order id, keyword, resolve status.
    pub fn from_filter(filter: &QueryFilter) -> Result<Self, QueryError> {
        let property = filter.property();
        let value = filter.value();

        if property == ID_PROPERTY {
            let id = ObjectId::parse_str(value)
                .map_err(|_| QueryError::InvalidId(value.to_string()))?;
            return Ok(Self::ObjectIdCompare {
                operator: filter.operator(),
                id,
            });
        }

        if property == KEYWORD_PROPERTY {
            return Ok(Self::TextSearch(value.to_string()));
        }

        if property == RESOLVE_STATUS_PROPERTY && value == RESOLVE_STATUS_ALL {
            return Ok(Self::NotNull {
                field: property.to_string(),
            });
        }

        Ok(Self::Compare {
            field: property.to_string(),
            operator: filter.operator(),
            value: value.to_string(),
        })
    }

    /// Top-level key this clause occupies
    pub fn key(&self) -> &str {
        match self {
            Self::ObjectIdCompare { .. } => MONGO_ID_FIELD,
            Self::TextSearch(_) => MONGO_TEXT_OPERATOR,
            Self::NotNull { field } | Self::Compare { field, .. } => field,
            Self::Limit(_) => MONGO_LIMIT_KEY,
        }
    }

    /// Value stored under [`key`](Self::key)
    pub fn value(&self) -> Bson {
        match self {
            Self::ObjectIdCompare { operator, id } => {
                Bson::Document(doc! { operator.mongo_operator(): *id })
            }
            Self::TextSearch(terms) => Bson::Document(doc! { "$search": terms.as_str() }),
            Self::NotNull { .. } => Bson::Document(doc! { "$ne": Bson::Null }),
            Self::Compare {
                operator, value, ..
            } => Bson::Document(doc! { operator.mongo_operator(): value.as_str() }),
            Self::Limit(top) => Bson::String(top.clone()),
        }
    }
}

/// Translate a parsed query into a MongoDB filter document.
///
/// Clause order follows the filter order, with `$limit` last when a top
/// value is present. A second clause for an already-used key is rejected.
pub fn to_mongo_filter(query: &Query) -> Result<Document, QueryError> {
    let mut clauses = query
        .filters
        .iter()
        .map(MongoClause::from_filter)
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(top) = &query.top {
        clauses.push(MongoClause::Limit(top.clone()));
    }

    let mut document = Document::new();
    for clause in clauses {
        let key = clause.key().to_string();
        if document.contains_key(&key) {
            return Err(QueryError::DuplicateKey(key));
        }
        document.insert(key, clause.value());
    }

    tracing::trace!(filter = %document, "Translated search query");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(property: &str, operator: ComparisonOperator, value: &str) -> QueryFilter {
        QueryFilter::new(property, operator, value).unwrap()
    }

    fn query(filters: Vec<QueryFilter>, top: Option<&str>) -> Query {
        Query {
            filters,
            top: top.map(String::from),
            select: None,
        }
    }

    #[test]
    fn test_translate_default_comparison() {
        let q = query(
            vec![filter("Project", ComparisonOperator::Eq, "Safari")],
            None,
        );
        let document = to_mongo_filter(&q).unwrap();
        assert_eq!(document, doc! { "Project": { "$eq": "Safari" } });
    }

    #[test]
    fn test_translate_id_uses_object_id() {
        let hex = "5f1a2b3c4d5e6f7a8b9c0d1e";
        let q = query(vec![filter("Id", ComparisonOperator::Eq, hex)], None);
        let document = to_mongo_filter(&q).unwrap();

        assert!(!document.contains_key("Id"));
        let id = ObjectId::parse_str(hex).unwrap();
        assert_eq!(document, doc! { "_id": { "$eq": id } });
    }

    #[test]
    fn test_translate_id_keeps_operator() {
        let hex = "5f1a2b3c4d5e6f7a8b9c0d1e";
        let q = query(vec![filter("Id", ComparisonOperator::Gt, hex)], None);
        let document = to_mongo_filter(&q).unwrap();
        let inner = document.get_document("_id").unwrap();
        assert!(inner.contains_key("$gt"));
    }

    #[test]
    fn test_translate_invalid_id_fails() {
        let q = query(vec![filter("Id", ComparisonOperator::Eq, "nothex")], None);
        assert_eq!(
            to_mongo_filter(&q),
            Err(QueryError::InvalidId("nothex".to_string()))
        );
    }

    #[test]
    fn test_translate_keyword_is_text_search() {
        let q = query(vec![filter("Keyword", ComparisonOperator::Eq, "crash")], None);
        let document = to_mongo_filter(&q).unwrap();
        assert_eq!(document, doc! { "$text": { "$search": "crash" } });
    }

    #[test]
    fn test_translate_resolve_status_all_ignores_operator() {
        for op in [ComparisonOperator::Eq, ComparisonOperator::Lt] {
            let q = query(vec![filter("ResolveStatus", op, "All")], None);
            let document = to_mongo_filter(&q).unwrap();
            assert_eq!(document, doc! { "ResolveStatus": { "$ne": Bson::Null } });
        }
    }

    #[test]
    fn test_translate_resolve_status_other_value_is_plain() {
        let q = query(
            vec![filter("ResolveStatus", ComparisonOperator::Eq, "Closed")],
            None,
        );
        let document = to_mongo_filter(&q).unwrap();
        assert_eq!(document, doc! { "ResolveStatus": { "$eq": "Closed" } });
    }

    #[test]
    fn test_translate_unknown_property_passes_through() {
        let q = query(vec![filter("Nonsense", ComparisonOperator::Ne, "x")], None);
        let document = to_mongo_filter(&q).unwrap();
        assert_eq!(document, doc! { "Nonsense": { "$ne": "x" } });
    }

    #[test]
    fn test_translate_top_appends_limit_last() {
        let q = query(
            vec![
                filter("Project", ComparisonOperator::Eq, "Safari"),
                filter("Category", ComparisonOperator::Eq, "Crash"),
            ],
            Some("5"),
        );
        let document = to_mongo_filter(&q).unwrap();
        let keys: Vec<&String> = document.keys().collect();
        assert_eq!(keys, vec!["Project", "Category", "$limit"]);
        assert_eq!(document.get_str("$limit").unwrap(), "5");
    }

    #[test]
    fn test_translate_duplicate_key_fails() {
        let q = query(
            vec![
                filter("Project", ComparisonOperator::Eq, "A"),
                filter("Project", ComparisonOperator::Eq, "B"),
            ],
            None,
        );
        assert_eq!(
            to_mongo_filter(&q),
            Err(QueryError::DuplicateKey("Project".to_string()))
        );
    }

    #[test]
    fn test_translate_empty_query_is_empty_document() {
        let document = to_mongo_filter(&Query::default()).unwrap();
        assert!(document.is_empty());
    }
}

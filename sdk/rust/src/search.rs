//! Issue search form to query string

use serde::Deserialize;

use crate::odata::{ODataOperator, QueryBuilder};

/// How a start/end pair of a search form is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RangeSearch {
    /// Equal to the start value
    #[default]
    Exact,
    Before,
    After,
    Between,
}

/// Search form fields; empty or missing fields do not filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssueSearchParameters {
    pub keyword: Option<String>,
    pub id: Option<String>,
    pub author: Option<String>,
    pub assigned_to: Option<String>,
    pub project: Option<String>,
    pub team: Option<String>,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub category: Option<String>,
    pub resolve_status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_search_type: RangeSearch,
    pub start_version: Option<String>,
    pub end_version: Option<String>,
    pub version_search_type: RangeSearch,
    pub top: Option<String>,
}

fn value(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or_default()
}

fn add_range(
    builder: &mut QueryBuilder,
    search: RangeSearch,
    (start_name, start): (&str, &str),
    (end_name, end): (&str, &str),
) {
    match search {
        RangeSearch::Exact => {
            builder.add_filter(start_name, start, ODataOperator::Eq);
        }
        RangeSearch::Before => {
            builder.add_filter(start_name, start, ODataOperator::Lt);
        }
        RangeSearch::After => {
            builder.add_filter(start_name, start, ODataOperator::Gt);
        }
        RangeSearch::Between => {
            builder
                .add_filter(start_name, start, ODataOperator::Gt)
                .add_filter(end_name, end, ODataOperator::Lt);
        }
    }
}

impl IssueSearchParameters {
    pub fn to_query_builder(&self) -> QueryBuilder {
        let mut builder = QueryBuilder::new();
        for (name, field) in [
            ("keyword", &self.keyword),
            ("id", &self.id),
            ("author", &self.author),
            ("assignedTo", &self.assigned_to),
            ("project", &self.project),
            ("team", &self.team),
            ("platform", &self.platform),
            ("product", &self.product),
            ("category", &self.category),
            ("resolveStatus", &self.resolve_status),
        ] {
            builder.add_filter(name, value(field), ODataOperator::Eq);
        }

        add_range(
            &mut builder,
            self.date_search_type,
            ("startDate", value(&self.start_date)),
            ("endDate", value(&self.end_date)),
        );
        add_range(
            &mut builder,
            self.version_search_type,
            ("startVersion", value(&self.start_version)),
            ("endVersion", value(&self.end_version)),
        );

        builder.add_top(value(&self.top));
        builder
    }

    pub fn to_query_string(&self) -> String {
        self.to_query_builder().build()
    }
}

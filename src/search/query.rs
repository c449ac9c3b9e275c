//! Search query building

use crate::models::Passenger;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fields covered by free-text passenger search
pub const FREE_TEXT_FIELDS: [&str; 10] = [
    "apis",
    "pnr",
    "firstName",
    "lastName",
    "carrier",
    "flightNumber",
    "origin",
    "destination",
    "addresses",
    "documents",
];

/// Fields highlighted by link analysis, in rendering order
pub const LINK_HIGHLIGHT_FIELDS: [&str; 4] =
    ["documents.documentNumber", "lastName", "firstName", "pnr"];

/// Sort order for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Lenient parse: any casing of "asc" is ascending, everything else descending
    pub fn parse_lenient(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("asc") {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Field to sort by
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSort {
    pub field: String,
    pub order: SortOrder,
}

/// Query tree sent to the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Query {
    /// Text matched against several fields; every matching field adds to the score
    MultiMatch { query: String, fields: Vec<String> },

    /// Analyzed text match on one field
    Match { field: String, value: String },

    /// Any of the exact values on one field
    Terms { field: String, values: Vec<String> },

    /// All of `must` and, when `must` is empty, at least one of `should`
    Bool { must: Vec<Query>, should: Vec<Query> },
}

impl Query {
    pub fn matching(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        Query::Terms {
            field: field.into(),
            values,
        }
    }

    pub fn all_of(must: Vec<Query>) -> Self {
        Query::Bool {
            must,
            should: Vec::new(),
        }
    }

    pub fn any_of(should: Vec<Query>) -> Self {
        Query::Bool {
            must: Vec::new(),
            should,
        }
    }

    /// Render as engine query DSL
    pub fn to_json(&self) -> Value {
        match self {
            Query::MultiMatch { query, fields } => json!({
                "multi_match": {
                    "query": query,
                    "fields": fields,
                    "type": "most_fields",
                }
            }),
            Query::Match { field, value } => json!({ "match": { field.as_str(): value } }),
            Query::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Query::Bool { must, should } => {
                let mut clauses = serde_json::Map::new();
                if !must.is_empty() {
                    clauses.insert(
                        "must".to_string(),
                        Value::Array(must.iter().map(Query::to_json).collect()),
                    );
                }
                if !should.is_empty() {
                    clauses.insert(
                        "should".to_string(),
                        Value::Array(should.iter().map(Query::to_json).collect()),
                    );
                }
                json!({ "bool": clauses })
            }
        }
    }
}

/// A complete search request: query plus paging, sort and highlighting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySpec {
    pub query: Query,

    /// Offset of the first hit returned
    pub from: usize,

    /// Maximum number of hits returned
    pub size: usize,

    pub sort: Option<SearchSort>,

    /// Fields for which the engine should return highlight fragments
    pub highlight_fields: Vec<String>,
}

impl QuerySpec {
    /// Create a spec for `query` with 1-based paging.
    ///
    /// Page 0 is treated as page 1. An empty sort field leaves ordering to relevance.
    pub fn new(
        query: Query,
        page: usize,
        page_size: usize,
        sort_field: &str,
        sort_direction: &str,
    ) -> Self {
        let sort = if sort_field.trim().is_empty() {
            None
        } else {
            Some(SearchSort {
                field: sort_field.to_string(),
                order: SortOrder::parse_lenient(sort_direction),
            })
        };

        Self {
            query,
            from: page.saturating_sub(1).saturating_mul(page_size),
            size: page_size,
            sort,
            highlight_fields: Vec::new(),
        }
    }

    /// Request highlight fragments for `fields`
    pub fn with_highlight(mut self, fields: &[&str]) -> Self {
        self.highlight_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Render the request body for the engine's search endpoint
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "query": self.query.to_json(),
            "from": self.from,
            "size": self.size,
        });

        if let Some(sort) = &self.sort {
            body["sort"] = json!([{ sort.field.as_str(): { "order": sort.order.as_str() } }]);
        }

        if !self.highlight_fields.is_empty() {
            let fields: serde_json::Map<String, Value> = self
                .highlight_fields
                .iter()
                .map(|f| (f.clone(), json!({})))
                .collect();
            body["highlight"] = json!({ "fields": fields });
        }

        body
    }
}

/// Query builder for the two passenger search shapes
pub struct QueryBuilder;

impl QueryBuilder {
    /// Free-text search across all passenger, flight, payload and document fields
    pub fn free_text(
        query: &str,
        page: usize,
        page_size: usize,
        sort_field: &str,
        sort_direction: &str,
    ) -> QuerySpec {
        let query = Query::MultiMatch {
            query: query.to_string(),
            fields: FREE_TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        QuerySpec::new(query, page, page_size, sort_field, sort_direction)
    }

    /// Link analysis: records sharing the passenger's name or any of its document numbers.
    ///
    /// Any one clause qualifies a record:
    /// - first AND last name match
    /// - a document number appears among the record's documents
    /// - a document number appears in the reservation text
    /// - the last name appears in the reservation text
    pub fn link_analysis(
        passenger: &Passenger,
        page: usize,
        page_size: usize,
        sort_field: &str,
        sort_direction: &str,
    ) -> QuerySpec {
        let document_numbers = passenger.document_numbers();

        let query = Query::any_of(vec![
            Query::all_of(vec![
                Query::matching("firstName", passenger.first_name.as_str()),
                Query::matching("lastName", passenger.last_name.as_str()),
            ]),
            Query::terms("documents.documentNumber", document_numbers.clone()),
            Query::terms("pnr", document_numbers),
            Query::matching("pnr", passenger.last_name.as_str()),
        ]);

        QuerySpec::new(query, page, page_size, sort_field, sort_direction)
            .with_highlight(&LINK_HIGHLIGHT_FIELDS)
    }
}

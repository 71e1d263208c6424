//! Backend-agnostic query descriptor produced by the query builder.
//!
//! A `StructuredQuery` is immutable once built and is consumed by a single
//! search gateway call.

use serde::{Deserialize, Serialize};

/// How the values of a filter clause combine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombineOp {
    #[default]
    And,
    Or,
}

/// Value side of a filter clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum FilterValue {
    /// A single exact value.
    Term(String),
    /// A set of exact values, combined with the clause's `combine_op`.
    Terms(Vec<String>),
    /// A boolean expression in query-string syntax, scoped to the clause field.
    Expression(String),
}

/// A single field filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterClause {
    pub field: String,
    pub value: FilterValue,
    pub combine_op: CombineOp,
}

impl FilterClause {
    /// Exact match on a single value.
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: FilterValue::Term(value.into()),
            combine_op: CombineOp::And,
        }
    }

    /// Match any of the given values.
    pub fn any_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            value: FilterValue::Terms(values.into_iter().map(Into::into).collect()),
            combine_op: CombineOp::Or,
        }
    }

    /// Query-string expression evaluated against `field`.
    pub fn expression(field: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: FilterValue::Expression(expression.into()),
            combine_op: CombineOp::And,
        }
    }

    /// Number of values carried by the clause.
    pub fn value_count(&self) -> usize {
        match &self.value {
            FilterValue::Terms(values) => values.len(),
            FilterValue::Term(_) | FilterValue::Expression(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }
}

/// Structured, backend-agnostic search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    /// Free text. Empty means "match everything".
    pub text: String,

    /// Fields the free text is matched against.
    pub query_fields: Vec<String>,

    /// Number of groups to return.
    pub page_size: usize,

    /// Zero-based page index.
    #[serde(default)]
    pub page_index: usize,

    /// `None` leaves ordering to the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortClause>,

    /// `None` lets the backend apply its default grouping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    /// Clauses every document must satisfy.
    pub required_filters: Vec<FilterClause>,

    /// Clauses no document may satisfy.
    pub excluded_filters: Vec<FilterClause>,
}

impl StructuredQuery {
    /// Find a required clause by field.
    pub fn required(&self, field: &str) -> Option<&FilterClause> {
        self.required_filters.iter().find(|c| c.field == field)
    }

    /// Find an excluded clause by field.
    pub fn excluded(&self, field: &str) -> Option<&FilterClause> {
        self.excluded_filters.iter().find(|c| c.field == field)
    }

    /// Offset of the first group, derived from page size and index.
    pub fn offset(&self) -> usize {
        self.page_size.saturating_mul(self.page_index)
    }
}

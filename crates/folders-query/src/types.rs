use crate::predicate::{compare_values, lookup, Predicate};
use folders_mapping::CompareMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Whether a filter keeps or drops the rows it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionType {
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
    /// The token is neither `key` nor `key desc`.
    Undefined,
}

/// A compiled filter token.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// Dotted DTO path as sent.
    pub key: String,
    /// Source member path the predicate tests. For `ById` filters this ends
    /// at the foreign-key column, for `Nested` filters at the collection.
    pub end_point: Vec<String>,
    pub compare_method: CompareMethod,
    pub raw_value: String,
    /// Entity the predicate runs against.
    pub entity_type: String,
    /// Element filter of a `Nested` expression.
    pub inner: Option<Box<FilterExpression>>,
    pub expression_type: ExpressionType,
    pub predicate: Predicate,
}

impl FilterExpression {
    pub fn matches(&self, row: &Value) -> bool {
        self.predicate.eval(row)
    }
}

/// A compiled order token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByExpression {
    pub key: String,
    pub end_point: Vec<String>,
    pub expression_type: OrderDirection,
}

impl OrderByExpression {
    /// Orders two rows by this expression. Missing values sort first when
    /// ascending.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = match (lookup(a, &self.end_point), lookup(b, &self.end_point)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        };
        match self.expression_type {
            OrderDirection::Ascending => ordering,
            OrderDirection::Descending => ordering.reverse(),
            OrderDirection::Undefined => Ordering::Equal,
        }
    }
}

/// A list request. `filters` and `orders` are filled in by
/// [`ListQueryValidator`](crate::ListQueryValidator) from the raw tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub take: Option<usize>,
    #[serde(skip)]
    pub filters: Vec<FilterExpression>,
    #[serde(skip)]
    pub orders: Vec<OrderByExpression>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, token: impl Into<String>) -> Self {
        self.filter.push(token.into());
        self
    }

    pub fn order_by(mut self, token: impl Into<String>) -> Self {
        self.order_by.push(token.into());
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}

/// Paging and size limits of list requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Page size when the request names none.
    pub default_take: usize,
    pub max_take: usize,
    pub max_filters: usize,
    pub max_orders: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_take: 50,
            max_take: 1000,
            max_filters: 20,
            max_orders: 5,
        }
    }
}

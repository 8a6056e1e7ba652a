//! Validation of list requests, fused with compilation: every token that
//! passes is compiled exactly once and appended to the query.

use crate::error::CompileError;
use crate::filter::{filter_key, property_of, FilterCompiler, FilterToken};
use crate::order::OrderCompiler;
use crate::types::{FilterExpression, ListQuery, OrderByExpression, OrderDirection, QueryOptions};
use folders_mapping::{FieldFailure, MappingAdapter};

pub const PROPERTY_EXISTS: &str = "PropertyExistsValidator";
pub const CAN_PARSE_FILTER: &str = "CanParseFilterValidator";
pub const FILTERABLE: &str = "FilterableValidator";
pub const CAN_PARSE_ORDER: &str = "CanParseOrderValidator";
pub const TAKE_RANGE: &str = "InclusiveBetweenValidator";
pub const MAX_ITEMS: &str = "MaxItemsValidator";

type Failure = (&'static str, String);

#[derive(Debug, Clone)]
pub struct ListQueryValidator {
    adapter: MappingAdapter,
    filters: FilterCompiler,
    orders: OrderCompiler,
    options: QueryOptions,
}

impl ListQueryValidator {
    pub fn new(adapter: MappingAdapter, options: QueryOptions) -> Self {
        Self {
            filters: FilterCompiler::new(adapter.clone()),
            orders: OrderCompiler::new(adapter.clone()),
            adapter,
            options,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Checks `query` against `dto_type` and replaces its compiled filters
    /// and orders with the tokens that passed. An empty result means the
    /// query may be executed.
    pub fn validate(&self, query: &mut ListQuery, dto_type: &str) -> Vec<FieldFailure> {
        query.filters.clear();
        query.orders.clear();
        let mut failures = self.check_paging(query);

        for (index, token) in query.filter.iter().enumerate() {
            match self.check_filter(token, dto_type) {
                Ok(expression) => query.filters.push(expression),
                Err((code, message)) => {
                    failures.push(FieldFailure::new(format!("filter[{index}]"), code, message))
                }
            }
        }
        for (index, token) in query.order_by.iter().enumerate() {
            match self.check_order(token, dto_type) {
                Ok(expression) => query.orders.push(expression),
                Err((code, message)) => {
                    failures.push(FieldFailure::new(format!("orderBy[{index}]"), code, message))
                }
            }
        }
        if !failures.is_empty() {
            tracing::debug!(dto_type, failures = failures.len(), "list query rejected");
        }
        failures
    }

    fn check_paging(&self, query: &ListQuery) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        if let Some(take) = query.take.filter(|take| !(1..=self.options.max_take).contains(take)) {
            failures.push(FieldFailure::new(
                "take",
                TAKE_RANGE,
                format!("'take' must be between 1 and {}. You entered {take}.", self.options.max_take),
            ));
        }
        let limits = [
            ("filter", query.filter.len(), self.options.max_filters),
            ("orderBy", query.order_by.len(), self.options.max_orders),
        ];
        for (property, len, max) in limits {
            if len > max {
                failures.push(FieldFailure::new(
                    property,
                    MAX_ITEMS,
                    format!("'{property}' must contain {max} items or fewer. You entered {len} items."),
                ));
            }
        }
        failures
    }

    fn check_filter(&self, token: &str, dto_type: &str) -> Result<FilterExpression, Failure> {
        self.check_exists(property_of(filter_key(token)), dto_type)?;
        let parsed = FilterToken::parse(token).map_err(|e| (CAN_PARSE_FILTER, e.to_string()))?;
        self.filters
            .compare_method(parsed.property(), dto_type)
            .map_err(filter_failure)?;
        self.filters.compile_token(&parsed, dto_type).map_err(filter_failure)
    }

    fn check_order(&self, token: &str, dto_type: &str) -> Result<OrderByExpression, Failure> {
        let property = token.split(' ').next().map(property_of).unwrap_or_default();
        self.check_exists(property, dto_type)?;
        let expression = self
            .orders
            .compile(token, dto_type)
            .map_err(|e| (CAN_PARSE_ORDER, e.to_string()))?;
        if expression.expression_type == OrderDirection::Undefined {
            return Err((
                CAN_PARSE_ORDER,
                format!("Order '{token}' must look like 'property' or 'property desc'."),
            ));
        }
        Ok(expression)
    }

    fn check_exists(&self, property: &str, dto_type: &str) -> Result<(), Failure> {
        let exists = self
            .adapter
            .catalog()
            .get(dto_type)
            .is_some_and(|descriptor| descriptor.get(property).is_some());
        if exists {
            Ok(())
        } else {
            Err((
                PROPERTY_EXISTS,
                CompileError::UnknownProperty {
                    dto: dto_type.to_string(),
                    property: property.to_string(),
                }
                .to_string(),
            ))
        }
    }
}

fn filter_failure(e: CompileError) -> Failure {
    match e {
        CompileError::NotFilterable(_) => (FILTERABLE, e.to_string()),
        other => (CAN_PARSE_FILTER, other.to_string()),
    }
}

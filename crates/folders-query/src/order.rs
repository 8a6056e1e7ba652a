//! `"<dotted-path>[ desc]"` order tokens.

use crate::error::CompileError;
use crate::member::KeyPath;
use crate::types::{OrderByExpression, OrderDirection};
use folders_mapping::MappingAdapter;

const DESCENDING: &str = " desc";

/// Splits the direction off an order token.
///
/// ```
/// use folders_query::{parse_direction, OrderDirection};
///
/// assert_eq!(parse_direction("name"), ("name", OrderDirection::Ascending));
/// assert_eq!(parse_direction("owner.name desc"), ("owner.name", OrderDirection::Descending));
/// assert_eq!(parse_direction("name asc"), ("name asc", OrderDirection::Undefined));
/// ```
pub fn parse_direction(token: &str) -> (&str, OrderDirection) {
    if !token.contains(' ') {
        return (token, OrderDirection::Ascending);
    }
    match token.strip_suffix(DESCENDING) {
        Some(key) if !key.is_empty() && !key.contains(' ') => (key, OrderDirection::Descending),
        _ => (token, OrderDirection::Undefined),
    }
}

#[derive(Debug, Clone)]
pub struct OrderCompiler {
    adapter: MappingAdapter,
}

impl OrderCompiler {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    /// Compiles `token` against `dto_type`. Tokens with an `Undefined`
    /// direction compile to an expression that does not resolve any path;
    /// callers reject them.
    pub fn compile(&self, token: &str, dto_type: &str) -> Result<OrderByExpression, CompileError> {
        let (key, expression_type) = parse_direction(token);
        if expression_type == OrderDirection::Undefined {
            return Ok(OrderByExpression {
                key: key.to_string(),
                end_point: Vec::new(),
                expression_type,
            });
        }
        let path = KeyPath::resolve(&self.adapter, dto_type, key)?;
        path.scalar(key)?;
        tracing::trace!(key, end_point = ?path.end_point, ?expression_type, "order compiled");
        Ok(OrderByExpression {
            key: key.to_string(),
            end_point: path.end_point,
            expression_type,
        })
    }
}

//! List queries over read DTOs.
//!
//! Filter tokens (`"name:a,b"`, `"count!:1..5"`, `"channels.id:4"`) and
//! order tokens (`"name"`, `"name desc"`) are addressed in DTO space and
//! compiled against the type catalog into predicates and orderings over
//! source rows:
//!
//! 1. [`ListQueryValidator`] checks each token (the property exists, the
//!    token parses, the property is filterable) and stores the compiled
//!    [`FilterExpression`]s and [`OrderByExpression`]s on the [`ListQuery`].
//! 2. [`ListExecutor`] loads the origin entity set, applies the filters in
//!    order, sorts stably by each order in turn, pages, and projects the
//!    rows into the DTO.
//!
//! ```
//! use folders_query::{ExpressionType, FilterToken, OrderDirection, parse_direction};
//!
//! let token = FilterToken::parse("someCount!:3..7").unwrap();
//! assert_eq!(token.expression_type, ExpressionType::Exclude);
//! assert_eq!(parse_direction("someCount desc").1, OrderDirection::Descending);
//! ```

mod error;
mod execute;
mod filter;
mod member;
mod order;
mod predicate;
mod types;
mod validator;

pub use error::{CompileError, QueryError};
pub use execute::{ListExecutor, ListPage};
pub use filter::{filter_key, FilterCompiler, FilterToken, RawValue};
pub use order::{parse_direction, OrderCompiler};
pub use predicate::Predicate;
pub use types::{ExpressionType, FilterExpression, ListQuery, OrderByExpression, OrderDirection, QueryOptions};
pub use validator::{
    ListQueryValidator, CAN_PARSE_FILTER, CAN_PARSE_ORDER, FILTERABLE, MAX_ITEMS, PROPERTY_EXISTS,
    TAKE_RANGE,
};

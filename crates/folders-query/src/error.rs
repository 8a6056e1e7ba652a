use folders_mapping::{FieldFailure, MappingError};
use folders_store::StoreError;
use thiserror::Error;

/// A filter or order token that can not be compiled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Filter '{0}' must look like 'property:value'.")]
    Malformed(String),

    #[error("Property '{property}' does not exist on {dto}.")]
    UnknownProperty { dto: String, property: String },

    #[error("Property '{0}' is not filterable.")]
    NotFilterable(String),

    #[error("Value '{value}' is not a valid {expected}.")]
    InvalidValue { value: String, expected: String },

    #[error("Path '{key}' can not be resolved at '{segment}': {reason}.")]
    Path {
        key: String,
        segment: String,
        reason: String,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("list query is not valid ({} failures)", .0.len())]
    Rejected(Vec<FieldFailure>),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("list query cancelled")]
    Cancelled,
}

use crate::types::OpKind;
use crate::validate::ValidationError;
use folders_mapping::{FieldFailure, MappingError, TypeRef};
use folders_store::StoreError;
use thiserror::Error;

/// A DTO path that does not resolve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("path '{path}' can not be resolved at segment '{segment}': {reason}")]
pub struct PathError {
    /// The full path as sent.
    pub path: String,
    pub segment: String,
    pub reason: String,
}

/// A payload that does not fit the resolved type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoerceError {
    #[error("value is not valid")]
    NotValid { expected: TypeRef },
    #[error("value is not an array")]
    NotArray { expected: TypeRef },
}

impl CoerceError {
    pub fn expected(&self) -> &TypeRef {
        match self {
            CoerceError::NotValid { expected } | CoerceError::NotArray { expected } => expected,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertCause {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Value(#[from] CoerceError),
    #[error("operation requires a value")]
    MissingValue,
}

/// Conversion failure, reported against the DTO path the client sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path}: {cause}")]
pub struct ConvertError {
    pub index: usize,
    pub path: String,
    pub cause: ConvertCause,
}

/// Why a live application step failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyCause {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("{entity} #{id} does not exist")]
    NotFound { entity: String, id: i64 },
    #[error("can not change existing entity {entity} #{id}")]
    AlreadyExists { entity: String, id: i64 },
    #[error("can not change not existing entity")]
    MissingTarget,
    #[error("position '{0}' is out of bounds")]
    OutOfBounds(String),
    #[error("unsupported target: {0}")]
    UnsupportedTarget(String),
    #[error("operation '{0}' is not supported")]
    UnsupportedOperation(OpKind),
    #[error("operation requires a value")]
    MissingValue,
}

/// The document was rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("operation [index = {index}] at '{dto_path}' failed: {cause}")]
pub struct ApplyFailure {
    pub index: usize,
    pub dto_path: String,
    pub cause: ApplyCause,
}

/// Outcome of the full decode → validate → convert → apply pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error(transparent)]
    Document(#[from] ValidationError),
    #[error("patch document is not valid ({} failures)", .0.len())]
    Rejected(Vec<FieldFailure>),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Apply(#[from] ApplyFailure),
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("entity '{0}' is not stored")]
    UnknownEntity(String),

    #[error("{entity} has no column '{column}'")]
    UnknownColumn { entity: String, column: String },

    #[error("{entity}.{property} is not a collection navigation")]
    NotCollection { entity: String, property: String },

    #[error("{entity} record has no integer key")]
    MissingKey { entity: String },

    /// The store expected to affect a row that is not there (any more).
    #[error("conflict: expected to affect {entity} #{id}, but 0 rows were affected")]
    Conflict { entity: String, id: i64 },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

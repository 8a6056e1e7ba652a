use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("type '{0}' is not registered")]
    UnknownType(String),

    #[error("property '{property}' is not mapped on '{ty}'")]
    NotFound { ty: String, property: String },

    #[error("type '{0}' is not a DTO")]
    NotDto(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid mapping for '{ty}.{property}': {reason}")]
    InvalidMapping {
        ty: String,
        property: String,
        reason: String,
    },
}

impl MappingError {
    pub(crate) fn not_found(ty: &str, property: &str) -> Self {
        MappingError::NotFound {
            ty: ty.to_string(),
            property: property.to_string(),
        }
    }
}

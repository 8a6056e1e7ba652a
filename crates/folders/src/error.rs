use crate::auth::AuthError;
use crate::config::ConfigError;
use folders_mapping::MappingError;
use folders_patch::PatchError;
use folders_query::{CompileError, QueryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

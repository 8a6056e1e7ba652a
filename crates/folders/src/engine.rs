//! The assembled engines over the folders catalog.

use crate::catalog::{self, FOLDER_DTO};
use crate::config::EngineConfig;
use crate::error::ServiceError;
use folders_mapping::{Catalog, MappingAdapter};
use folders_patch::PatchEngine;
use folders_query::{FilterCompiler, FilterExpression, ListExecutor, ListQueryValidator};
use std::sync::{Arc, OnceLock};

static SHARED: OnceLock<Engine> = OnceLock::new();

/// Everything a request needs, built once from the catalog and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct Engine {
    pub config: EngineConfig,
    pub catalog: Arc<Catalog>,
    pub adapter: MappingAdapter,
    pub patch: PatchEngine,
    pub queries: ListQueryValidator,
    pub executor: ListExecutor,
    filters: FilterCompiler,
}

impl Engine {
    pub fn build(config: EngineConfig) -> Result<Self, ServiceError> {
        let catalog = Arc::new(catalog::catalog()?);
        let mappings = catalog::mappings(catalog.clone())?;
        let adapter = MappingAdapter::new(catalog.clone(), Arc::new(mappings));
        tracing::debug!(types = catalog.types().count(), "folders engine built");
        Ok(Self {
            patch: PatchEngine::new(adapter.clone(), config.patch),
            queries: ListQueryValidator::new(adapter.clone(), config.query.clone()),
            executor: ListExecutor::new(adapter.clone(), config.query.clone()),
            filters: FilterCompiler::new(adapter.clone()),
            config,
            catalog,
            adapter,
        })
    }

    /// Restricts folder lists to those owned by `user_id`.
    pub fn owner_filter(&self, user_id: i64) -> Result<FilterExpression, ServiceError> {
        Ok(self.filters.compile(&format!("owner:{user_id}"), FOLDER_DTO)?)
    }
}

/// The process-wide engine, built with `config` on first use. Later calls
/// return the same instance and ignore their `config`.
pub fn init(config: EngineConfig) -> Result<&'static Engine, ServiceError> {
    if let Some(engine) = SHARED.get() {
        return Ok(engine);
    }
    let engine = Engine::build(config)?;
    Ok(SHARED.get_or_init(|| engine))
}

/// The process-wide engine with the default configuration unless
/// [`init`] ran first.
pub fn shared() -> Result<&'static Engine, ServiceError> {
    init(EngineConfig::default())
}

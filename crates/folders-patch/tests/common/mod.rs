#![allow(dead_code)]

use folders_mapping::{Catalog, MappingAdapter};
use folders_patch::{PatchEngine, PatchOptions};
use folders_store::{fixtures, MemoryStore};
use std::sync::Arc;

pub use folders_store::fixtures::{NESTED_ENTITY, TEST_ENTITY, TEST_ENTITY_EDIT_DTO, TEST_NOTE};

pub struct Harness {
    pub catalog: Arc<Catalog>,
    pub adapter: MappingAdapter,
    pub store: MemoryStore,
    pub engine: PatchEngine,
}

pub fn harness() -> Harness {
    let catalog = Arc::new(fixtures::catalog().expect("fixture catalog"));
    let mappings = fixtures::mappings(catalog.clone()).expect("fixture mappings");
    let adapter = MappingAdapter::new(catalog.clone(), Arc::new(mappings));
    let store = fixtures::store(catalog.clone()).expect("fixture store");
    let engine = PatchEngine::new(adapter.clone(), PatchOptions::default());
    Harness {
        catalog,
        adapter,
        store,
        engine,
    }
}

#![allow(dead_code)]

use folders_mapping::Catalog;
use folders_store::{fixtures, MemoryStore};
use std::sync::Arc;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(fixtures::catalog().expect("fixture catalog"))
}

pub fn store() -> MemoryStore {
    fixtures::store(catalog()).expect("fixture store")
}

#![allow(dead_code)]

use folders_mapping::MappingAdapter;
use folders_query::{ListExecutor, ListPage, ListQuery, ListQueryValidator, QueryOptions};
use folders_store::{fixtures, MemoryStore};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use folders_store::fixtures::{ENTITY_COUNT, TEST_ENTITY_DTO};

pub struct Harness {
    pub adapter: MappingAdapter,
    pub store: MemoryStore,
    pub validator: ListQueryValidator,
    pub executor: ListExecutor,
}

pub fn harness() -> Harness {
    let catalog = Arc::new(fixtures::catalog().expect("fixture catalog"));
    let mappings = fixtures::mappings(catalog.clone()).expect("fixture mappings");
    let adapter = MappingAdapter::new(catalog.clone(), Arc::new(mappings));
    let options = QueryOptions::default();
    Harness {
        store: fixtures::store(catalog).expect("fixture store"),
        validator: ListQueryValidator::new(adapter.clone(), options.clone()),
        executor: ListExecutor::new(adapter.clone(), options),
        adapter,
    }
}

impl Harness {
    /// Validates and runs `query` over `TestEntityDto`.
    pub async fn list(&self, mut query: ListQuery) -> ListPage {
        let failures = self.validator.validate(&mut query, TEST_ENTITY_DTO);
        assert!(failures.is_empty(), "{failures:?}");
        self.executor
            .execute(&query, TEST_ENTITY_DTO, &self.store, &CancellationToken::new())
            .await
            .expect("list query")
    }
}

pub fn ids(page: &ListPage) -> Vec<i64> {
    page.items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_i64))
        .collect()
}

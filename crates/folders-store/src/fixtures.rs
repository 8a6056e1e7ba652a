//! A small seeded schema shared by test suites.
//!
//! `TestEntity` rows `1..=25` each point at one `NestedEntity` through a
//! foreign key, link to one or two nested entities through the many-to-many
//! `nestedThings`, and own a few `TestNote`s.

use crate::{MemoryStore, StoreError};
use folders_mapping::{
    Catalog, CompareMethod, LinkTable, MappingAdapter, MappingError, Mappings, PropertyDescriptor,
    Rule, RuleValidator, ScalarType, TypeDescriptor, TypeRef,
};
use serde_json::json;
use std::sync::Arc;

pub const ENTITY_COUNT: i64 = 25;
pub const NESTED_COUNT: i64 = 8;

pub const TEST_ENTITY: &str = "TestEntity";
pub const NESTED_ENTITY: &str = "NestedEntity";
pub const TEST_NOTE: &str = "TestNote";

pub const TEST_ENTITY_DTO: &str = "TestEntityDto";
pub const TEST_ENTITY_EDIT_DTO: &str = "TestEntityEditDto";

/// `nestedThings` targets of `TestEntity #id`.
pub fn nested_links(id: i64) -> Vec<i64> {
    let mut links = vec![id % 4 + 1];
    if id % 3 == 0 {
        links.push(5);
    }
    links
}

pub fn some_count(id: i64) -> i64 {
    (id - 1) / 2
}

pub fn catalog() -> Result<Catalog, MappingError> {
    let id = || PropertyDescriptor::scalar("id", ScalarType::Int64);
    Catalog::builder()
        .register(
            TypeDescriptor::entity(NESTED_ENTITY)
                .property(id())
                .property(PropertyDescriptor::scalar("name", ScalarType::String))
                .property(PropertyDescriptor::scalar("number", ScalarType::Int64)),
        )
        .register(
            TypeDescriptor::entity(TEST_NOTE)
                .property(id())
                .property(PropertyDescriptor::scalar("text", ScalarType::String))
                .property(PropertyDescriptor::scalar("testEntityId", ScalarType::Int64)),
        )
        .register(
            TypeDescriptor::entity(TEST_ENTITY)
                .property(id())
                .property(PropertyDescriptor::scalar("name", ScalarType::String))
                .property(PropertyDescriptor::scalar("someCount", ScalarType::Int32))
                .property(PropertyDescriptor::scalar("someInnerEntityId", ScalarType::Int64))
                .property(PropertyDescriptor::reference(
                    "someInnerEntity",
                    NESTED_ENTITY,
                    "someInnerEntityId",
                ))
                .property(PropertyDescriptor::many_to_many(
                    "nestedThings",
                    NESTED_ENTITY,
                    LinkTable::new("test_entity_nested", "testEntityId", "nestedEntityId"),
                ))
                .property(PropertyDescriptor::one_to_many("notes", TEST_NOTE, "testEntityId")),
        )
        .register(
            TypeDescriptor::read_dto("NestedDto", NESTED_ENTITY)
                .property(id().filterable(CompareMethod::Equals))
                .property(
                    PropertyDescriptor::scalar("nestedName", ScalarType::String)
                        .filterable(CompareMethod::Equals),
                )
                .property(
                    PropertyDescriptor::scalar("number", ScalarType::Int64)
                        .filterable(CompareMethod::Equals),
                ),
        )
        .register(
            TypeDescriptor::read_dto("TestNoteDto", TEST_NOTE)
                .property(id().filterable(CompareMethod::Equals))
                .property(
                    PropertyDescriptor::scalar("text", ScalarType::String)
                        .filterable(CompareMethod::Equals),
                ),
        )
        .register(
            TypeDescriptor::read_dto(TEST_ENTITY_DTO, TEST_ENTITY)
                .property(id().filterable(CompareMethod::Equals))
                .property(
                    PropertyDescriptor::scalar("entityName", ScalarType::String)
                        .filterable(CompareMethod::Equals),
                )
                .property(
                    PropertyDescriptor::scalar("someCount", ScalarType::Int32)
                        .filterable(CompareMethod::Equals),
                )
                .property(
                    PropertyDescriptor::new("someInnerEntity", TypeRef::named("NestedDto"))
                        .filterable(CompareMethod::ById),
                )
                .property(PropertyDescriptor::scalar("innerName", ScalarType::String))
                .property(
                    PropertyDescriptor::new(
                        "nestedThings",
                        TypeRef::collection_of(TypeRef::named("NestedDto")),
                    )
                    .filterable(CompareMethod::Nested),
                )
                .property(
                    PropertyDescriptor::new(
                        "notes",
                        TypeRef::collection_of(TypeRef::named("TestNoteDto")),
                    )
                    .filterable(CompareMethod::Nested),
                ),
        )
        .register(
            TypeDescriptor::edit_dto("NestedEditDto", NESTED_ENTITY)
                .property(id())
                .property(PropertyDescriptor::scalar("nestedName", ScalarType::String))
                .property(PropertyDescriptor::scalar("number", ScalarType::Int64))
                .conversion(ScalarType::Int32, |id| Some(json!({ "id": id })))
                .validator(RuleValidator::new().rule("nestedName", Rule::MaxLength(64))),
        )
        .register(
            TypeDescriptor::edit_dto("TestNoteEditDto", TEST_NOTE)
                .property(id())
                .property(PropertyDescriptor::scalar("text", ScalarType::String))
                .validator(RuleValidator::new().rule("text", Rule::NotEmpty)),
        )
        .register(
            TypeDescriptor::edit_dto(TEST_ENTITY_EDIT_DTO, TEST_ENTITY)
                .property(id())
                .property(PropertyDescriptor::scalar("entityName", ScalarType::String))
                .property(PropertyDescriptor::scalar("someCount", ScalarType::Int32))
                .property(PropertyDescriptor::new(
                    "someInnerEntity",
                    TypeRef::named("NestedEditDto"),
                ))
                .property(PropertyDescriptor::new(
                    "nestedThings",
                    TypeRef::collection_of(TypeRef::named("NestedEditDto")),
                ))
                .property(PropertyDescriptor::new(
                    "notes",
                    TypeRef::collection_of(TypeRef::named("TestNoteEditDto")),
                ))
                .validator(
                    RuleValidator::new()
                        .rule("entityName", Rule::Required)
                        .rule("entityName", Rule::MaxLength(50))
                        .rule(
                            "someCount",
                            Rule::Range {
                                min: 0.0,
                                max: 1000.0,
                            },
                        ),
                ),
        )
        .build()
}

pub fn mappings(catalog: Arc<Catalog>) -> Result<Mappings, MappingError> {
    Mappings::builder(catalog)
        .map_member("NestedDto", "nestedName", "name")
        .map_member("NestedEditDto", "nestedName", "name")
        .map_member(TEST_ENTITY_DTO, "entityName", "name")
        .map_path(TEST_ENTITY_DTO, "innerName", "someInnerEntity.name")
        .map_path(TEST_ENTITY_EDIT_DTO, "entityName", "name")
        .build()
}

pub fn adapter() -> Result<MappingAdapter, MappingError> {
    let catalog = Arc::new(catalog()?);
    let mappings = mappings(catalog.clone())?;
    Ok(MappingAdapter::new(catalog, Arc::new(mappings)))
}

/// A store seeded with the fixture rows.
pub fn store(catalog: Arc<Catalog>) -> Result<MemoryStore, StoreError> {
    let nested = (1..=NESTED_COUNT).map(|id| {
        json!({"id": id, "name": format!("nested-{id}"), "number": id * 10})
    });
    let entities = (1..=ENTITY_COUNT).map(|id| {
        json!({
            "id": id,
            "name": format!("entity-{id}"),
            "someCount": some_count(id),
            "someInnerEntityId": id % NESTED_COUNT + 1,
        })
    });
    let notes = [
        json!({"id": 1, "text": "first", "testEntityId": 1}),
        json!({"id": 2, "text": "second", "testEntityId": 1}),
        json!({"id": 3, "text": "third", "testEntityId": 2}),
    ];

    let mut builder = MemoryStore::builder(catalog)
        .rows(NESTED_ENTITY, nested)?
        .rows(TEST_ENTITY, entities)?
        .rows(TEST_NOTE, notes)?;
    for id in 1..=ENTITY_COUNT {
        for target in nested_links(id) {
            builder = builder.link(TEST_ENTITY, "nestedThings", id, target)?;
        }
    }
    Ok(builder.build())
}

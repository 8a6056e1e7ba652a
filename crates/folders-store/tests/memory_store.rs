mod common;

use folders_store::fixtures::{ENTITY_COUNT, NESTED_ENTITY, TEST_ENTITY, TEST_NOTE};
use folders_store::{EntityState, EntityStore, StoreError, StoreSession};
use serde_json::{json, Map, Value};

fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[tokio::test]
async fn query_loads_includes_in_insertion_order() {
    let store = common::store();
    let rows = store
        .query(TEST_ENTITY, &["someInnerEntity".into(), "nestedThings".into(), "notes".into()])
        .await
        .unwrap();
    assert_eq!(rows.len() as i64, ENTITY_COUNT);
    let first = &rows[0];
    assert_eq!(first["id"], json!(1));
    assert_eq!(first["someInnerEntity"]["id"], json!(2));
    assert_eq!(first["nestedThings"], json!([{"id": 2, "name": "nested-2", "number": 20}]));
    assert_eq!(first["notes"].as_array().map(Vec::len), Some(2));
    assert!(rows[1].get("notes").is_some());
    assert!(rows[1].get("missing").is_none());
}

#[tokio::test]
async fn modified_stub_updates_only_given_columns() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session
        .track(TEST_ENTITY, record(json!({"id": 1, "name": "renamed"})), EntityState::Modified)
        .unwrap();
    assert_eq!(session.save_changes().await.unwrap(), 1);
    session.commit().await.unwrap();

    let row = store.row(TEST_ENTITY, 1).await.unwrap().unwrap();
    assert_eq!(row["name"], json!("renamed"));
    assert_eq!(row["someInnerEntityId"], json!(2));
}

#[tokio::test]
async fn dropped_session_leaves_tables_unchanged() {
    let store = common::store();
    {
        let mut session = store.begin().await.unwrap();
        session
            .track(TEST_ENTITY, record(json!({"id": 2})), EntityState::Deleted)
            .unwrap();
        session.save_changes().await.unwrap();
        assert!(session.load(TEST_ENTITY, 2, &[]).await.unwrap().is_none());
    }
    assert!(store.row(TEST_ENTITY, 2).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_missing_row_conflicts() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session
        .track(TEST_ENTITY, record(json!({"id": 3_000_000})), EntityState::Deleted)
        .unwrap();
    let err = session.save_changes().await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Conflict {
            entity: TEST_ENTITY.into(),
            id: 3_000_000
        }
    );
    session.rollback().await.unwrap();
}

#[tokio::test]
async fn delete_cascades_links_and_children() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session
        .track(TEST_ENTITY, record(json!({"id": 1})), EntityState::Deleted)
        .unwrap();
    // row + one link row + two notes
    assert_eq!(session.save_changes().await.unwrap(), 4);
    session.commit().await.unwrap();

    assert!(store.linked(TEST_ENTITY, "nestedThings", 1).await.unwrap().is_empty());
    assert!(store.row(TEST_NOTE, 1).await.unwrap().is_none());
    assert!(store.row(TEST_NOTE, 3).await.unwrap().is_some());
}

#[tokio::test]
async fn referenced_rows_can_not_be_deleted() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session
        .track(NESTED_ENTITY, record(json!({"id": 2})), EntityState::Deleted)
        .unwrap();
    let err = session.save_changes().await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn added_rows_get_fresh_keys() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    let first = session
        .track(TEST_NOTE, record(json!({"text": "a", "testEntityId": 4})), EntityState::Added)
        .unwrap();
    let second = session
        .track(TEST_NOTE, record(json!({"text": "b", "testEntityId": 4})), EntityState::Added)
        .unwrap();
    assert_eq!((first, second), (4, 5));
    assert_eq!(session.save_changes().await.unwrap(), 2);

    let loaded = session.load(TEST_ENTITY, 4, &["notes".into()]).await.unwrap().unwrap();
    assert_eq!(loaded["notes"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn dangling_foreign_keys_are_rejected() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session
        .track(TEST_NOTE, record(json!({"text": "x", "testEntityId": 999})), EntityState::Added)
        .unwrap();
    assert!(matches!(
        session.save_changes().await,
        Err(StoreError::ConstraintViolation(_))
    ));
}

#[tokio::test]
async fn link_rows_are_unique() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session.append_to_collection(TEST_ENTITY, 1, "nestedThings", 4).unwrap();
    session.save_changes().await.unwrap();
    session.append_to_collection(TEST_ENTITY, 1, "nestedThings", 4).unwrap();
    assert!(matches!(
        session.save_changes().await,
        Err(StoreError::ConstraintViolation(_))
    ));
}

#[tokio::test]
async fn unlinking_touches_only_the_link_table() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    session.remove_from_collection(TEST_ENTITY, 3, "nestedThings", 5).unwrap();
    assert_eq!(session.save_changes().await.unwrap(), 1);
    session.commit().await.unwrap();

    assert_eq!(store.linked(TEST_ENTITY, "nestedThings", 3).await.unwrap(), [4]);
    assert!(store.row(NESTED_ENTITY, 5).await.unwrap().is_some());
}

#[tokio::test]
async fn children_are_removed_only_through_their_parent() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    // note 1 belongs to entity 1
    let err = session.remove_from_collection(TEST_ENTITY, 2, "notes", 1).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref entity, id: 1 } if entity == TEST_NOTE));
    assert!(session.remove_from_collection(TEST_ENTITY, 1, "notes", 99).is_err());

    session.remove_from_collection(TEST_ENTITY, 1, "notes", 1).unwrap();
    assert_eq!(session.save_changes().await.unwrap(), 1);
    session.commit().await.unwrap();
    assert!(store.row(TEST_NOTE, 1).await.unwrap().is_none());
    assert!(store.row(TEST_NOTE, 2).await.unwrap().is_some());
}

#[tokio::test]
async fn commit_replays_onto_concurrent_changes() {
    let store = common::store();
    let mut a = store.begin().await.unwrap();
    let mut b = store.begin().await.unwrap();

    a.track(TEST_ENTITY, record(json!({"id": 5, "name": "a"})), EntityState::Modified)
        .unwrap();
    a.save_changes().await.unwrap();
    b.track(TEST_ENTITY, record(json!({"id": 5})), EntityState::Deleted)
        .unwrap();
    b.save_changes().await.unwrap();

    b.commit().await.unwrap();
    let err = a.commit().await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { id: 5, .. }));
    assert!(store.row(TEST_ENTITY, 5).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_columns_and_entities_fail_fast() {
    let store = common::store();
    let mut session = store.begin().await.unwrap();
    assert!(matches!(
        session.track(TEST_ENTITY, record(json!({"id": 1, "bogus": 1})), EntityState::Modified),
        Err(StoreError::UnknownColumn { .. })
    ));
    assert!(matches!(
        session.track("Nope", Map::new(), EntityState::Added),
        Err(StoreError::UnknownEntity(_))
    ));
    assert!(matches!(
        session.append_to_collection(TEST_ENTITY, 1, "someInnerEntity", 1),
        Err(StoreError::NotCollection { .. })
    ));
}

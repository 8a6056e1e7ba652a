mod common;

use common::{harness, NESTED_ENTITY, TEST_ENTITY, TEST_ENTITY_EDIT_DTO, TEST_NOTE};
use folders_patch::{ApplyCause, OpKind, Operation, OperationConverter, PatchApplier, PatchError};
use folders_store::fixtures::NESTED_COUNT;
use folders_store::{EntityStore, StoreError};
use serde_json::{json, Value};

async fn name_of(h: &common::Harness, entity: &str, id: i64) -> Value {
    h.store.row(entity, id).await.unwrap().unwrap()["name"].clone()
}

#[tokio::test]
async fn replace_changes_only_the_mapped_field() {
    let h = harness();
    let doc = json!([{"op": "replace", "path": "/1/entityName", "value": "NewValue1"}]);
    let report = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();
    assert_eq!(report.affected, 1);

    assert_eq!(name_of(&h, TEST_ENTITY, 1).await, json!("NewValue1"));
    assert_eq!(name_of(&h, TEST_ENTITY, 2).await, json!("entity-2"));
    let row = h.store.row(TEST_ENTITY, 1).await.unwrap().unwrap();
    assert_eq!(row["someCount"], json!(0));
}

#[tokio::test]
async fn replace_through_a_reference_changes_the_referenced_entity() {
    let h = harness();
    let doc = json!([{"op": "replace", "path": "/1/someInnerEntity/nestedName", "value": "X"}]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();

    assert_eq!(name_of(&h, NESTED_ENTITY, 2).await, json!("X"));
    let row = h.store.row(TEST_ENTITY, 1).await.unwrap().unwrap();
    assert_eq!(row["someInnerEntityId"], json!(2));
    assert_eq!(row["name"], json!("entity-1"));
}

#[tokio::test]
async fn adding_to_a_many_to_many_collection_only_links() {
    let h = harness();
    let doc = json!([{
        "op": "add",
        "path": "/1/nestedThings/-",
        "value": {"id": 4, "nestedName": "q", "number": 111111}
    }]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();

    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 1).await.unwrap(), [2, 4]);
    let nested = h.store.query(NESTED_ENTITY, &[]).await.unwrap();
    assert_eq!(nested.len() as i64, NESTED_COUNT);
    assert_eq!(name_of(&h, NESTED_ENTITY, 4).await, json!("nested-4"));
}

#[tokio::test]
async fn bare_ids_convert_into_links() {
    let h = harness();
    let doc = json!([{"op": "add", "path": "/2/nestedThings/-", "value": 7}]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();
    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 2).await.unwrap(), [3, 7]);
}

#[tokio::test]
async fn removing_a_missing_entity_rolls_back_everything() {
    let h = harness();
    let doc = json!([
        {"op": "replace", "path": "/1/entityName", "value": "changed"},
        {"op": "remove", "path": "/3000000"}
    ]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    let PatchError::Apply(failure) = err else {
        panic!("expected an apply failure");
    };
    assert_eq!(failure.index, 1);
    assert_eq!(failure.dto_path, "/3000000");
    assert_eq!(
        failure.cause,
        ApplyCause::Store(StoreError::Conflict {
            entity: TEST_ENTITY.into(),
            id: 3_000_000
        })
    );
    assert_eq!(name_of(&h, TEST_ENTITY, 1).await, json!("entity-1"));
}

#[tokio::test]
async fn single_missing_remove_reports_index_zero() {
    let h = harness();
    let doc = json!([{"op": "remove", "path": "/3000000"}]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    assert!(matches!(
        err,
        PatchError::Apply(ref failure) if failure.index == 0 && failure.dto_path == "/3000000"
    ));
}

#[tokio::test]
async fn adding_a_root_entity_inserts_the_owned_graph() {
    let h = harness();
    let doc = json!([{
        "op": "add",
        "path": "/-",
        "value": {
            "entityName": "fresh",
            "someCount": 3,
            "someInnerEntity": {"id": 1},
            "nestedThings": [{"id": 1}, 2],
            "notes": [{"text": "owned"}]
        }
    }]);
    let report = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();
    // entity, two link rows, one note
    assert_eq!(report.affected, 4);

    let row = h.store.row(TEST_ENTITY, 26).await.unwrap().unwrap();
    assert_eq!(row["name"], json!("fresh"));
    assert_eq!(row["someInnerEntityId"], json!(1));
    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 26).await.unwrap(), [1, 2]);
    let note = h.store.row(TEST_NOTE, 4).await.unwrap().unwrap();
    assert_eq!(note["testEntityId"], json!(26));
    assert_eq!(h.store.query(NESTED_ENTITY, &[]).await.unwrap().len() as i64, NESTED_COUNT);
}

#[tokio::test]
async fn later_operations_see_earlier_ones() {
    let h = harness();
    let doc = json!([
        {"op": "add", "path": "/-", "value": {"entityName": "a", "someCount": 1}},
        {"op": "replace", "path": "/26/entityName", "value": "b"},
        {"op": "add", "path": "/26/notes/-", "value": {"text": "hello"}}
    ]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();
    assert_eq!(name_of(&h, TEST_ENTITY, 26).await, json!("b"));
    let note = h.store.row(TEST_NOTE, 4).await.unwrap().unwrap();
    assert_eq!(note["testEntityId"], json!(26));
}

#[tokio::test]
async fn removing_from_collections() {
    let h = harness();
    let doc = json!([
        {"op": "remove", "path": "/3/nestedThings/5"},
        {"op": "remove", "path": "/1/notes/2"}
    ]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();

    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 3).await.unwrap(), [4]);
    assert!(h.store.row(NESTED_ENTITY, 5).await.unwrap().is_some());
    assert!(h.store.row(TEST_NOTE, 2).await.unwrap().is_none());
    assert!(h.store.row(TEST_NOTE, 1).await.unwrap().is_some());
}

#[tokio::test]
async fn removing_a_missing_link_is_not_found() {
    let h = harness();
    let doc = json!([{"op": "remove", "path": "/1/nestedThings/7"}]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    assert!(matches!(
        err,
        PatchError::Apply(ref failure)
            if matches!(failure.cause, ApplyCause::NotFound { ref entity, id: 7 } if entity == NESTED_ENTITY)
    ));
}

#[tokio::test]
async fn removing_another_parents_note_rolls_back() {
    let h = harness();
    // note 1 belongs to entity 1
    let doc = json!([
        {"op": "replace", "path": "/2/entityName", "value": "changed"},
        {"op": "remove", "path": "/2/notes/1"}
    ]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    let PatchError::Apply(failure) = err else {
        panic!("expected an apply failure");
    };
    assert_eq!(failure.index, 1);
    assert_eq!(failure.dto_path, "/2/notes/1");
    assert!(matches!(failure.cause, ApplyCause::NotFound { ref entity, id: 1 } if entity == TEST_NOTE));

    assert!(h.store.row(TEST_NOTE, 1).await.unwrap().is_some());
    assert_eq!(name_of(&h, TEST_ENTITY, 2).await, json!("entity-2"));
}

#[tokio::test]
async fn removing_another_parents_link_fails() {
    let h = harness();
    // nested entity 4 is linked to entity 3, not entity 2
    let doc = json!([{"op": "remove", "path": "/2/nestedThings/4"}]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    assert!(matches!(
        err,
        PatchError::Apply(ref failure)
            if matches!(failure.cause, ApplyCause::NotFound { ref entity, id: 4 } if entity == NESTED_ENTITY)
    ));
    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 3).await.unwrap(), [4, 5]);
    assert_eq!(h.store.linked(TEST_ENTITY, "nestedThings", 2).await.unwrap(), [3]);
}

#[tokio::test]
async fn replacing_collection_elements_and_references() {
    let h = harness();
    let doc = json!([
        {"op": "replace", "path": "/1/notes/2/text", "value": "edited"},
        {"op": "replace", "path": "/1/someInnerEntity", "value": {"id": 5}},
        {"op": "replace", "path": "/2", "value": {"entityName": "whole", "someCount": 9}}
    ]);
    h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap();

    let note = h.store.row(TEST_NOTE, 2).await.unwrap().unwrap();
    assert_eq!(note["text"], json!("edited"));
    let row = h.store.row(TEST_ENTITY, 1).await.unwrap().unwrap();
    assert_eq!(row["someInnerEntityId"], json!(5));
    let row = h.store.row(TEST_ENTITY, 2).await.unwrap().unwrap();
    assert_eq!((row["name"].clone(), row["someCount"].clone()), (json!("whole"), json!(9)));
}

#[tokio::test]
async fn replacing_a_whole_collection_is_rejected_at_application() {
    let h = harness();
    let doc = json!([{"op": "replace", "path": "/1/nestedThings", "value": []}]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    assert!(matches!(
        err,
        PatchError::Apply(ref failure) if matches!(failure.cause, ApplyCause::UnsupportedTarget(_))
    ));
}

#[tokio::test]
async fn missing_nested_elements_are_not_found() {
    let h = harness();
    let doc = json!([{"op": "replace", "path": "/1/notes/3/text", "value": "x"}]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    let PatchError::Apply(failure) = err else {
        panic!("expected an apply failure");
    };
    assert_eq!(
        failure.cause,
        ApplyCause::NotFound {
            entity: TEST_NOTE.into(),
            id: 3
        }
    );
}

#[tokio::test]
async fn validation_failures_stop_before_mutation() {
    let h = harness();
    let doc = json!([
        {"op": "replace", "path": "/1/entityName", "value": "fine"},
        {"op": "replace", "path": "/1/someCount", "value": 5000}
    ]);
    let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
    let PatchError::Rejected(failures) = err else {
        panic!("expected rejection");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(name_of(&h, TEST_ENTITY, 1).await, json!("entity-1"));
}

#[tokio::test]
async fn unsupported_operations_are_defects_in_the_applier() {
    let h = harness();
    let copy = Operation {
        op: OpKind::Copy,
        path: "/2".into(),
        value: None,
        from: Some("/1".into()),
    };
    let ops = OperationConverter::new(h.adapter.clone())
        .convert(&[Operation::replace("/1/entityName", json!("x")), copy], TEST_ENTITY_EDIT_DTO)
        .unwrap();
    let failure = PatchApplier::new(h.adapter.clone())
        .apply(&ops, &h.store)
        .await
        .unwrap_err();
    assert_eq!(failure.index, 1);
    assert_eq!(failure.cause, ApplyCause::UnsupportedOperation(OpKind::Copy));
    assert_eq!(name_of(&h, TEST_ENTITY, 1).await, json!("entity-1"));
}

#[tokio::test]
async fn malformed_documents_fail_before_validation() {
    let h = harness();
    let err = h
        .engine
        .patch(&json!([]), TEST_ENTITY_EDIT_DTO, &h.store)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Empty operation patch.");
}

#[tokio::test]
async fn keys_can_not_be_replaced() {
    let h = harness();
    for path in ["/1/id", "/1/notes/2/id", "/1/someInnerEntity/id"] {
        let doc = json!([{"op": "replace", "path": path, "value": 5}]);
        let err = h.engine.patch(&doc, TEST_ENTITY_EDIT_DTO, &h.store).await.unwrap_err();
        assert!(
            matches!(err, PatchError::Apply(ref failure) if matches!(failure.cause, ApplyCause::UnsupportedTarget(_))),
            "{path}"
        );
    }
    assert_eq!(name_of(&h, TEST_ENTITY, 1).await, json!("entity-1"));
    assert_eq!(name_of(&h, TEST_ENTITY, 5).await, json!("entity-5"));
    assert!(h.store.row(TEST_NOTE, 2).await.unwrap().is_some());
}

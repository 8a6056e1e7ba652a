mod common;

use common::{harness, TEST_ENTITY_EDIT_DTO};
use folders_mapping::FieldFailure;
use folders_patch::{OpKind, Operation, PatchValidator};
use serde_json::json;

fn validate(ops: &[Operation]) -> Vec<FieldFailure> {
    PatchValidator::new(harness().adapter).validate(ops, TEST_ENTITY_EDIT_DTO)
}

fn codes(failures: &[FieldFailure]) -> Vec<&str> {
    failures.iter().map(|f| f.code.as_str()).collect()
}

#[test]
fn well_formed_documents_pass() {
    let failures = validate(&[
        Operation::replace("/1/entityName", json!("NewValue1")),
        Operation::replace("/1/someInnerEntity/nestedName", json!("X")),
        Operation::add("/1/nestedThings/-", json!({"id": 4, "nestedName": "q", "number": 111111})),
        Operation::add("/1/nestedThings/-", json!(4)),
        Operation::remove("/1/notes/2"),
        Operation::remove("/3000000"),
        Operation::add("/-", json!({"entityName": "fresh", "someCount": 1})),
    ]);
    assert!(failures.is_empty(), "{failures:?}");
}

#[test]
fn structural_path_rules() {
    let cases = [
        (Operation::add("/1/entityName", json!("x")), "available only for collections"),
        (Operation::add("/1/nestedThings/4", json!({"id": 4})), "can not change existing entity"),
        (Operation::remove("/1/someInnerEntity"), "available only for collections"),
        (Operation::remove("/1/nestedThings/-"), "can not change not existing entity"),
        (Operation::replace("/1/notes/-", json!({"text": "x"})), "can not change not existing entity"),
        (Operation::replace("/-/entityName", json!("x")), "can not change not existing entity"),
        (Operation::replace("/entityName", json!("x")), "expected an element id"),
    ];
    for (op, message) in cases {
        let failures = validate(&[op.clone()]);
        assert_eq!(codes(&failures), ["CanParsePathValidator"], "{op:?}");
        assert!(failures[0].message.contains(message), "{op:?}: {}", failures[0].message);
        assert_eq!(failures[0].property, op.path);
    }
}

#[test]
fn unresolvable_paths_name_the_segment() {
    let failures = validate(&[Operation::replace("/1/bogus", json!(1))]);
    assert_eq!(codes(&failures), ["CanParsePathValidator"]);
    assert!(failures[0].message.contains("'bogus'"));
}

#[test]
fn values_must_coerce() {
    let failures = validate(&[
        Operation::replace("/1/someCount", json!("abc")),
        Operation::replace("/1/nestedThings", json!({"id": 1})),
        Operation::add("/1/nestedThings/-", json!(5_000_000_000i64)),
    ]);
    assert_eq!(
        codes(&failures),
        ["CanParseValueValidator", "CanParseValueValidator", "CanParseValueValidator"]
    );
    assert_eq!(failures[0].message, "value is not valid for Int32.");
    assert!(failures[1].message.starts_with("value is not an array"));
}

#[test]
fn replace_runs_field_rules_scoped_to_the_field() {
    let failures = validate(&[Operation::replace("/1/entityName", json!(null))]);
    assert_eq!(codes(&failures), ["NotNullValidator"]);
    assert_eq!(failures[0].property, "/1/entityName");

    let failures = validate(&[Operation::replace("/1/someCount", json!(5000))]);
    assert_eq!(codes(&failures), ["InclusiveBetweenValidator"]);

    // entityName is required, but only someCount is being replaced
    assert!(validate(&[Operation::replace("/1/someCount", json!(7))]).is_empty());

    let failures = validate(&[Operation::replace("/1/notes/2/text", json!(""))]);
    assert_eq!(codes(&failures), ["NotEmptyValidator"]);
    assert_eq!(failures[0].property, "/1/notes/2/text");
}

#[test]
fn add_validates_the_whole_new_element() {
    let failures = validate(&[Operation::add("/-", json!({"someCount": 1}))]);
    assert_eq!(codes(&failures), ["NotNullValidator"]);
    assert_eq!(failures[0].property, "/-/entityName");

    let long = "x".repeat(65);
    let failures = validate(&[Operation::add("/1/nestedThings/-", json!({"id": 4, "nestedName": long}))]);
    assert_eq!(codes(&failures), ["MaximumLengthValidator"]);
    assert_eq!(failures[0].property, "/1/nestedThings/-/nestedName");
}

#[test]
fn path_failures_suppress_later_steps() {
    let failures = validate(&[Operation::add("/1/entityName", json!(12))]);
    assert_eq!(codes(&failures), ["CanParsePathValidator"]);
}

#[test]
fn unsupported_operations_are_reported() {
    let copy = Operation {
        op: OpKind::Copy,
        path: "/2".into(),
        value: None,
        from: Some("/1".into()),
    };
    let failures = validate(&[copy, Operation::remove("/1")]);
    assert_eq!(codes(&failures), ["SupportedOperationValidator"]);
}

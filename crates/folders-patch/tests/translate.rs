mod common;

use common::{harness, TEST_ENTITY_EDIT_DTO};
use folders_mapping::{ScalarType, TypeRef};
use folders_patch::{OpKind, Operation, OperationConverter, PathTranslator};
use folders_pointer::{parse_normalized, split_element_prefix};
use proptest::prelude::*;
use serde_json::json;

fn root() -> TypeRef {
    TypeRef::named(TEST_ENTITY_EDIT_DTO)
}

#[test]
fn renamed_members_translate_to_source_names() {
    let h = harness();
    let translator = PathTranslator::new(h.adapter);
    let t = translator.translate("/entityName", &root()).unwrap();
    assert_eq!(t.source_path, ["name"]);
    assert_eq!(t.trace.len(), 2);
    assert_eq!(t.trace.last().dto, TypeRef::Scalar(ScalarType::String));

    let t = translator.translate("someInnerEntity/nestedName", &root()).unwrap();
    assert_eq!(t.source_path, ["someInnerEntity", "name"]);
    assert_eq!(t.trace.steps()[1].source, TypeRef::named("NestedEntity"));
}

#[test]
fn element_components_pass_through() {
    let h = harness();
    let translator = PathTranslator::new(h.adapter);
    let t = translator.translate("/nestedThings/-", &root()).unwrap();
    assert_eq!(t.source_path, ["nestedThings", "-"]);
    let last = t.trace.last();
    assert!(last.is_collection_element);
    assert_eq!(last.dto, TypeRef::named("NestedEditDto"));
    assert_eq!(last.source, TypeRef::named("NestedEntity"));
}

#[test]
fn empty_path_resolves_to_itself() {
    let h = harness();
    let t = PathTranslator::new(h.adapter).translate("", &root()).unwrap();
    assert!(t.source_path.is_empty());
    assert_eq!(t.trace.len(), 1);
    assert_eq!(t.trace.root().source, TypeRef::named("TestEntity"));
}

#[test]
fn errors_name_the_full_path_and_segment() {
    let h = harness();
    let translator = PathTranslator::new(h.adapter);

    let err = translator.translate("/nestedThings/1/bogus", &root()).unwrap_err();
    assert_eq!(err.path, "/nestedThings/1/bogus");
    assert_eq!(err.segment, "bogus");

    let err = translator.translate("/notes/first", &root()).unwrap_err();
    assert_eq!(err.segment, "first");

    let err = translator.translate("/entityName/length", &root()).unwrap_err();
    assert!(err.to_string().contains("String has no properties"));
}

#[test]
fn converter_keeps_the_element_prefix_and_reports_dto_paths() {
    let h = harness();
    let converter = OperationConverter::new(h.adapter);
    let doc = [
        Operation::replace("/1/entityName", json!("x")),
        Operation::add("/1/nestedThings/-", json!({"id": 4, "nestedName": "q"})),
        Operation::remove("/3000000"),
    ];
    let ops = converter.convert(&doc, TEST_ENTITY_EDIT_DTO).unwrap();
    assert_eq!(ops[0].path, ["1", "name"]);
    assert_eq!(ops[1].value, Some(json!({"id": 4, "name": "q"})));
    assert_eq!(ops[2].op, OpKind::Remove);
    assert_eq!(ops[2].path, ["3000000"]);
    assert_eq!(ops[2].value, None);

    let err = converter
        .convert(&[Operation::replace("/1/someCount", json!("many"))], TEST_ENTITY_EDIT_DTO)
        .unwrap_err();
    assert_eq!(err.path, "/1/someCount");
    assert_eq!(err.to_string(), "/1/someCount: value is not valid");
}

#[test]
fn nested_values_are_rebuilt_in_source_shape() {
    let h = harness();
    let converter = OperationConverter::new(h.adapter);
    let op = Operation::add(
        "/-",
        json!({
            "entityName": "fresh",
            "someInnerEntity": {"id": 1, "nestedName": "inner"},
            "nestedThings": [{"id": 2}, 3],
            "notes": [{"text": "n"}]
        }),
    );
    let converted = converter.convert_operation(&op, TEST_ENTITY_EDIT_DTO).unwrap();
    assert_eq!(converted.path, ["-"]);
    assert_eq!(
        converted.value,
        Some(json!({
            "name": "fresh",
            "someInnerEntity": {"id": 1, "name": "inner"},
            "nestedThings": [{"id": 2}, {"id": 3}],
            "notes": [{"text": "n"}]
        }))
    );
}

#[test]
fn coercion_failures() {
    let h = harness();
    let converter = OperationConverter::new(h.adapter);
    let cause = |op: Operation| {
        converter
            .convert_operation(&op, TEST_ENTITY_EDIT_DTO)
            .unwrap_err()
            .to_string()
    };
    assert_eq!(cause(Operation::replace("/1/nestedThings", json!({"id": 1}))), "value is not an array");
    assert_eq!(cause(Operation::replace("/1/someInnerEntity", json!([1]))), "value is not valid");
    assert_eq!(cause(Operation::add("/1/nestedThings/-", json!(5_000_000_000i64))), "value is not valid");
    assert_eq!(cause(Operation::add("/1/notes/-", json!({"bogus": 1}))), "value is not valid");
}

fn element() -> impl Strategy<Value = String> {
    prop_oneof![(1i64..10_000).prop_map(|id| id.to_string()), Just("-".to_string())]
}

fn nested_member() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("nestedName"), Just("number"), Just("id")]
}

fn dto_path() -> impl Strategy<Value = Vec<String>> {
    let scalar = prop_oneof![Just("entityName"), Just("someCount"), Just("id")];
    prop_oneof![
        Just(Vec::new()),
        scalar.prop_map(|p| vec![p.to_string()]),
        nested_member().prop_map(|p| vec!["someInnerEntity".to_string(), p.to_string()]),
        (element(), proptest::option::of(nested_member()))
            .prop_map(|(e, p)| {
                let mut path = vec!["nestedThings".to_string(), e];
                path.extend(p.map(str::to_string));
                path
            }),
        (element(), proptest::option::of(Just("text")))
            .prop_map(|(e, p)| {
                let mut path = vec!["notes".to_string(), e];
                path.extend(p.map(str::to_string));
                path
            }),
    ]
}

proptest! {
    #[test]
    fn translation_preserves_segment_count(id in 1i64..1_000_000, rest in dto_path()) {
        let h = harness();
        let converter = OperationConverter::new(h.adapter);
        let mut steps = vec![id.to_string()];
        steps.extend(rest);
        let path = folders_pointer::format_json_pointer(&steps);

        let op = Operation::remove(path.clone());
        let translated = converter.translate(&op, TEST_ENTITY_EDIT_DTO).unwrap();
        prop_assert_eq!(translated.source_path.len(), steps.len());

        let parsed = parse_normalized(&path);
        let (_, below) = split_element_prefix(&parsed);
        prop_assert_eq!(translated.trace.len(), below.len() + 1);
    }
}

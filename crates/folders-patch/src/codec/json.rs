//! JSON codec for patch documents.
//!
//! `[{"op": "add" | "remove" | "replace", "path": "<dto path>", "value": <any>}]`

use crate::types::{OpKind, Operation};
use crate::validate::{validate_operations, ValidationError};
use crate::PatchOptions;
use serde_json::{json, Map, Value};

/// Decodes one operation object.
pub fn from_json(value: &Value) -> Result<Operation, ValidationError> {
    let map = value
        .as_object()
        .ok_or_else(|| ValidationError("OP_INVALID".into()))?;
    let op = map
        .get("op")
        .and_then(Value::as_str)
        .and_then(OpKind::parse)
        .ok_or_else(|| ValidationError("OP_UNKNOWN".into()))?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError("OP_PATH_INVALID".into()))?;
    Ok(Operation {
        op,
        path: path.to_string(),
        value: map.get("value").cloned(),
        from: map.get("from").and_then(Value::as_str).map(str::to_string),
    })
}

/// Encodes one operation object.
pub fn to_json(op: &Operation) -> Value {
    let mut map = Map::new();
    map.insert("op".into(), json!(op.op.as_str()));
    map.insert("path".into(), json!(op.path));
    if let Some(from) = &op.from {
        map.insert("from".into(), json!(from));
    }
    if let Some(value) = &op.value {
        map.insert("value".into(), value.clone());
    }
    Value::Object(map)
}

/// Validates and decodes a whole document.
pub fn decode_document(doc: &Value, options: &PatchOptions) -> Result<Vec<Operation>, ValidationError> {
    validate_operations(doc, options)?;
    doc.as_array()
        .into_iter()
        .flatten()
        .map(from_json)
        .collect()
}

pub fn encode_document(ops: &[Operation]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_shape() {
        let doc = json!([
            {"op": "replace", "path": "/1/entityName", "value": "NewValue1"},
            {"op": "remove", "path": "/3000000"},
            {"op": "copy", "path": "/2", "from": "/1"}
        ]);
        let ops = decode_document(&doc, &PatchOptions::default()).unwrap();
        assert_eq!(ops[0], Operation::replace("/1/entityName", json!("NewValue1")));
        assert_eq!(ops[1], Operation::remove("/3000000"));
        assert_eq!(ops[2].op, OpKind::Copy);
        assert_eq!(ops[2].from.as_deref(), Some("/1"));
        assert_eq!(encode_document(&ops), doc);
    }

    #[test]
    fn null_values_are_kept() {
        let op = from_json(&json!({"op": "replace", "path": "/1/someInnerEntity", "value": null})).unwrap();
        assert_eq!(op.value, Some(Value::Null));
    }
}

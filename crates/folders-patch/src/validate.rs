//! Structural validation of raw patch documents.
//!
//! Works on the raw JSON so untrusted input is rejected before decoding.
//! Errors name the failing operation:
//! `"Error in operation [index = N] (reason)."`.

use crate::types::{OpKind, PatchOptions};
use folders_pointer::{parse_json_pointer, validate_json_pointer, validate_path};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn err(msg: &str) -> ValidationError {
    ValidationError(msg.to_string())
}

/// Validates a whole document.
///
/// ```
/// use folders_patch::validate::validate_operations;
/// use folders_patch::PatchOptions;
/// use serde_json::json;
///
/// let options = PatchOptions::default();
/// assert!(validate_operations(&json!([{"op": "remove", "path": "/1"}]), &options).is_ok());
/// assert_eq!(
///     validate_operations(&json!([{"op": "add", "path": "/-"}]), &options)
///         .unwrap_err()
///         .to_string(),
///     "Error in operation [index = 0] (OP_VALUE_MISSING)."
/// );
/// ```
pub fn validate_operations(ops: &Value, options: &PatchOptions) -> Result<(), ValidationError> {
    let arr = ops.as_array().ok_or_else(|| err("Not a array."))?;
    if arr.is_empty() {
        return Err(err("Empty operation patch."));
    }
    if arr.len() > options.max_operations {
        return Err(ValidationError(format!(
            "Too many operations: {} (max {}).",
            arr.len(),
            options.max_operations
        )));
    }
    for (i, op) in arr.iter().enumerate() {
        validate_operation(op, options)
            .map_err(|e| ValidationError(format!("Error in operation [index = {i}] ({}).", e.0)))?;
    }
    Ok(())
}

/// Validates a single operation object.
pub fn validate_operation(op: &Value, options: &PatchOptions) -> Result<(), ValidationError> {
    let map = op.as_object().ok_or_else(|| err("OP_INVALID"))?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| err("OP_PATH_INVALID"))?;
    validate_pointer(path, options)?;

    let name = map
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| err("OP_UNKNOWN"))?;
    let kind = OpKind::parse(name).ok_or_else(|| err("OP_UNKNOWN"))?;
    if kind.takes_value() && !map.contains_key("value") {
        return Err(err("OP_VALUE_MISSING"));
    }
    if matches!(kind, OpKind::Copy | OpKind::Move) {
        validate_from(map, path, options)?;
    }
    Ok(())
}

fn validate_pointer(pointer: &str, options: &PatchOptions) -> Result<(), ValidationError> {
    let limits = options.pointer_limits();
    validate_json_pointer(pointer, &limits).map_err(|e| ValidationError(e.to_string()))?;
    validate_path(&parse_json_pointer(pointer), &limits).map_err(|e| ValidationError(e.to_string()))
}

fn validate_from(
    map: &Map<String, Value>,
    path: &str,
    options: &PatchOptions,
) -> Result<(), ValidationError> {
    let from = map
        .get("from")
        .and_then(Value::as_str)
        .ok_or_else(|| err("OP_FROM_INVALID"))?;
    validate_pointer(from, options)?;
    if map.get("op").and_then(Value::as_str) == Some("move") {
        let from_path = parse_json_pointer(from);
        let to_path = parse_json_pointer(path);
        if folders_pointer::is_child(&from_path, &to_path) {
            return Err(err("Cannot move into own children."));
        }
    }
    Ok(())
}

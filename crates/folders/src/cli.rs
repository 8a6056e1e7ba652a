//! Core of the `folders-patch` binary: a DTO-space patch in, the
//! source-space document out.

use crate::engine::Engine;
use crate::error::ServiceError;
use folders_mapping::{FieldFailure, TypeRole};
use folders_patch::{to_json, Operation, PatchError, SourceOperation};
use folders_pointer::format_json_pointer;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("'{0}' is not an edit DTO")]
    NotEditDto(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl CliError {
    /// Field failures of a rejected document.
    pub fn failures(&self) -> Option<&[FieldFailure]> {
        match self {
            CliError::Service(ServiceError::Patch(PatchError::Rejected(failures))) => Some(failures),
            _ => None,
        }
    }
}

impl From<PatchError> for CliError {
    fn from(e: PatchError) -> Self {
        CliError::Service(e.into())
    }
}

/// Validates the JSON patch `input` against `dto_type` and returns it
/// rewritten into source paths and payloads.
pub fn translate_patch(engine: &Engine, dto_type: &str, input: &str) -> Result<Value, CliError> {
    let is_edit_dto = engine
        .catalog
        .get(dto_type)
        .is_some_and(|descriptor| matches!(descriptor.role, TypeRole::EditDto { .. }));
    if !is_edit_dto {
        return Err(CliError::NotEditDto(dto_type.to_string()));
    }

    let document: Value = serde_json::from_str(input)?;
    let ops = engine.patch.decode(&document).map_err(PatchError::from)?;
    let failures = engine.patch.validate(&ops, dto_type);
    if !failures.is_empty() {
        return Err(PatchError::Rejected(failures).into());
    }
    let source = engine.patch.convert(&ops, dto_type).map_err(PatchError::from)?;
    Ok(Value::Array(source.iter().map(source_json).collect()))
}

fn source_json(op: &SourceOperation) -> Value {
    to_json(&Operation {
        op: op.op,
        path: format_json_pointer(&op.path),
        value: op.value.clone(),
        from: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FOLDER_DTO, FOLDER_EDIT_DTO};
    use crate::config::EngineConfig;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::build(EngineConfig::default()).unwrap()
    }

    #[test]
    fn documents_are_rewritten_into_source_space() {
        let input = r#"[
            {"op": "add", "path": "/1/notes/-", "value": {"text": "hi"}},
            {"op": "add", "path": "/1/channels/-", "value": 4},
            {"op": "remove", "path": "/2"}
        ]"#;
        assert_eq!(
            translate_patch(&engine(), FOLDER_EDIT_DTO, input).unwrap(),
            json!([
                {"op": "add", "path": "/1/notes/-", "value": {"body": "hi"}},
                {"op": "add", "path": "/1/channels/-", "value": {"id": 4}},
                {"op": "remove", "path": "/2"}
            ])
        );
    }

    #[test]
    fn rejections_carry_field_failures() {
        let input = r#"[{"op": "replace", "path": "/1/color", "value": "red"}]"#;
        let err = translate_patch(&engine(), FOLDER_EDIT_DTO, input).unwrap_err();
        let failures = err.failures().unwrap();
        assert_eq!(failures[0].code, "RegularExpressionValidator");
        assert_eq!(failures[0].property, "/1/color");
    }

    #[test]
    fn read_dtos_are_not_patchable() {
        let err = translate_patch(&engine(), FOLDER_DTO, "[]").unwrap_err();
        assert!(matches!(err, CliError::NotEditDto(_)));
        let err = translate_patch(&engine(), FOLDER_EDIT_DTO, "[").unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
    }
}

//! Pre-mutation validation of DTO-space documents.
//!
//! Each operation is checked in three short-circuiting steps: the path
//! resolves and fits the operation, the value coerces, and the edited DTO
//! passes its registered field rules.

use crate::convert::OperationConverter;
use crate::error::ConvertCause;
use crate::translate::Translated;
use crate::types::{OpKind, Operation, PathTrace};
use folders_mapping::{FieldFailure, MappingAdapter, MappingError, ValidatorFault};
use folders_pointer::{is_element_step, is_end_marker, is_id, parse_normalized};
use serde_json::Value;
use std::fmt;

pub const CAN_PARSE_PATH: &str = "CanParsePathValidator";
pub const CAN_PARSE_VALUE: &str = "CanParseValueValidator";
pub const SUPPORTED_OPERATION: &str = "SupportedOperationValidator";

#[derive(Debug, Clone)]
pub struct PatchValidator {
    adapter: MappingAdapter,
    converter: OperationConverter,
}

/// Step 3 could not run.
#[derive(Debug)]
enum DeepFault {
    Mapping(MappingError),
    Validator(ValidatorFault),
    Shape(&'static str),
}

impl fmt::Display for DeepFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeepFault::Mapping(e) => e.fmt(f),
            DeepFault::Validator(e) => e.fmt(f),
            DeepFault::Shape(what) => write!(f, "unexpected shape: {what}"),
        }
    }
}

impl From<MappingError> for DeepFault {
    fn from(e: MappingError) -> Self {
        DeepFault::Mapping(e)
    }
}

impl From<ValidatorFault> for DeepFault {
    fn from(e: ValidatorFault) -> Self {
        DeepFault::Validator(e)
    }
}

impl PatchValidator {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self {
            converter: OperationConverter::new(adapter.clone()),
            adapter,
        }
    }

    /// Validates every operation of a document addressed at a collection of
    /// `root_dto`. An empty result means the document may be applied.
    pub fn validate(&self, document: &[Operation], root_dto: &str) -> Vec<FieldFailure> {
        document
            .iter()
            .flat_map(|op| self.validate_operation(op, root_dto))
            .collect()
    }

    pub fn validate_operation(&self, op: &Operation, root_dto: &str) -> Vec<FieldFailure> {
        let fail = |code: &str, message: String| vec![FieldFailure::new(&op.path, code, message)];

        if !op.op.is_supported() {
            return fail(
                SUPPORTED_OPERATION,
                format!("Operation '{}' is not supported.", op.op),
            );
        }

        let trace = match self.check_path(op, root_dto) {
            Ok(Translated { trace, .. }) => trace,
            Err(message) => return fail(CAN_PARSE_PATH, message),
        };

        if op.op == OpKind::Remove {
            return Vec::new();
        }
        let Some(value) = &op.value else {
            return fail(CAN_PARSE_VALUE, ConvertCause::MissingValue.to_string());
        };
        if let Err(e) = self.converter.coercer().coerce(value, &trace) {
            return fail(CAN_PARSE_VALUE, format!("{e} for {}.", e.expected()));
        }

        match self.check_fields(op, value, &trace) {
            Ok(failures) => failures,
            Err(fault) => {
                tracing::debug!(dto_path = %op.path, %fault, "field validation skipped");
                Vec::new()
            }
        }
    }

    /// Step 1: the path resolves and the operation fits its target.
    fn check_path(&self, op: &Operation, root_dto: &str) -> Result<Translated, String> {
        let translated = self
            .converter
            .translate(op, root_dto)
            .map_err(|e| e.to_string())?;
        let steps = parse_normalized(&op.path);

        if let Some(first) = steps.first() {
            if !is_element_step(first) {
                return Err(format!("Path '{}' must start with an element id.", op.path));
            }
        }
        let (last, init) = match steps.split_last() {
            Some(split) => split,
            None if op.op == OpKind::Add => return Ok(translated),
            None => return Err(only_collections(op)),
        };
        if init.iter().any(|step| is_end_marker(step)) {
            return Err(not_existing(op));
        }
        match op.op {
            OpKind::Add if is_id(last) => Err(format!(
                "Path '{}': can not change existing entity.",
                op.path
            )),
            OpKind::Add | OpKind::Remove if !is_element_step(last) => Err(only_collections(op)),
            OpKind::Remove | OpKind::Replace if is_end_marker(last) => Err(not_existing(op)),
            _ => Ok(translated),
        }
    }

    /// Step 3: the registered validator of the edited DTO accepts the new
    /// value on a blank instance.
    fn check_fields(
        &self,
        op: &Operation,
        value: &Value,
        trace: &PathTrace,
    ) -> Result<Vec<FieldFailure>, DeepFault> {
        let whole_element = trace.len() == 1 || trace.last().is_collection_element;
        let (dto, field) = if whole_element {
            (&trace.last().dto, None)
        } else {
            let owner = trace.parent().ok_or(DeepFault::Shape("no owner"))?;
            let field = parse_normalized(&op.path).pop();
            (&owner.dto, field)
        };
        let dto = dto.as_named().ok_or(DeepFault::Shape("not a DTO"))?;
        let descriptor = self.adapter.catalog().require(dto)?;
        let Some(validator) = &descriptor.validator else {
            return Ok(Vec::new());
        };

        let mut instance = self.adapter.catalog().blank(dto)?;
        let target = instance
            .as_object_mut()
            .ok_or(DeepFault::Shape("blank instance"))?;
        let scope: Vec<String> = match &field {
            Some(field) => {
                target.insert(field.clone(), value.clone());
                vec![field.clone()]
            }
            None => {
                let object = value.as_object().ok_or(DeepFault::Shape("not an object"))?;
                for (key, item) in object {
                    target.insert(key.clone(), item.clone());
                }
                match op.op {
                    OpKind::Add => Vec::new(),
                    _ => object.keys().cloned().collect(),
                }
            }
        };

        let prefix = match &field {
            Some(_) => parse_normalized(&op.path)
                .split_last()
                .map(|(_, init)| folders_pointer::format_json_pointer(init))
                .unwrap_or_default(),
            None => folders_pointer::normalize(&op.path),
        };
        let failures = validator
            .validate(&instance)?
            .into_iter()
            .filter(|f| scope.is_empty() || scope.contains(&f.property))
            .map(|f| FieldFailure {
                property: format!("{prefix}/{}", f.property),
                ..f
            })
            .collect();
        Ok(failures)
    }
}

fn only_collections(op: &Operation) -> String {
    format!("Path '{}': {} available only for collections.", op.path, op.op)
}

fn not_existing(op: &Operation) -> String {
    format!("Path '{}': can not change not existing entity.", op.path)
}

//! DTO payload → source payload conversion.

use crate::error::CoerceError;
use crate::types::{PatchValue, PathTrace};
use folders_mapping::{MappingAdapter, ScalarType, TypeRef};
use serde_json::{Map, Value};

/// Rebuilds DTO-shaped payloads in source shape.
#[derive(Debug, Clone)]
pub struct ValueCoercer {
    adapter: MappingAdapter,
}

impl ValueCoercer {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    /// Coerces `value` into the terminal type of `trace`.
    pub fn coerce(&self, value: &Value, trace: &PathTrace) -> Result<Value, CoerceError> {
        self.coerce_to(&trace.last().dto, value)
    }

    /// Coerces `value` into the source shape of the DTO type `dto`.
    pub fn coerce_to(&self, dto: &TypeRef, value: &Value) -> Result<Value, CoerceError> {
        match dto {
            TypeRef::Scalar(scalar) => scalar.coerce(value).ok_or_else(|| not_valid(dto)),
            TypeRef::Collection(element) => match PatchValue::of(value) {
                PatchValue::Array(items) => items
                    .iter()
                    .map(|item| self.coerce_to(element, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                PatchValue::Object(_) | PatchValue::Scalar(_) => Err(CoerceError::NotArray {
                    expected: dto.clone(),
                }),
            },
            TypeRef::Named(name) => match PatchValue::of(value) {
                PatchValue::Object(object) => self.coerce_object(name, object),
                PatchValue::Scalar(Value::Null) => Ok(Value::Null),
                PatchValue::Scalar(scalar) => self.convert_scalar(name, scalar),
                PatchValue::Array(_) => Err(not_valid(dto)),
            },
        }
    }

    /// Resolves every key of a DTO object and rebuilds it under source
    /// member names.
    fn coerce_object(&self, dto_type: &str, object: &Map<String, Value>) -> Result<Value, CoerceError> {
        let mut source = Map::new();
        for (key, value) in object {
            let member = self
                .adapter
                .resolve(dto_type, key)
                .map_err(|_| not_valid(&TypeRef::named(dto_type)))?;
            let coerced = self.coerce_to(&member.dto_type, value)?;
            source.insert(member.source.name().to_string(), coerced);
        }
        Ok(Value::Object(source))
    }

    /// Applies a declared conversion from a bare scalar. Integers are
    /// narrowed to 32 bits before the lookup.
    fn convert_scalar(&self, dto_type: &str, value: &Value) -> Result<Value, CoerceError> {
        let invalid = || not_valid(&TypeRef::named(dto_type));
        let descriptor = self.adapter.catalog().get(dto_type).ok_or_else(invalid)?;
        let (scalar, narrowed) = ScalarType::narrow(value).ok_or_else(invalid)?;
        let conversion = descriptor.conversion_from(scalar).ok_or_else(invalid)?;
        (conversion.convert)(&narrowed).ok_or_else(invalid)
    }
}

fn not_valid(expected: &TypeRef) -> CoerceError {
    CoerceError::NotValid {
        expected: expected.clone(),
    }
}

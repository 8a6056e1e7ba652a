use crate::error::CompileError;
use folders_mapping::{MappingAdapter, MappingError, ScalarType, TypeRef};

/// A dotted DTO key resolved to its source member chain.
#[derive(Debug)]
pub(crate) struct KeyPath {
    pub end_point: Vec<String>,
    /// Declared DTO type of the last segment.
    pub ty: TypeRef,
}

impl KeyPath {
    /// Segments of a dotted key.
    pub fn segments(key: &str) -> impl Iterator<Item = &str> {
        key.split('.')
    }

    /// Resolves every segment of `key` starting at `dto_type`. Segments may
    /// only cross single DTOs, never collections.
    pub fn resolve(adapter: &MappingAdapter, dto_type: &str, key: &str) -> Result<Self, CompileError> {
        let mut end_point = Vec::new();
        let mut ty = TypeRef::named(dto_type);
        for segment in Self::segments(key) {
            let fail = |reason: String| CompileError::Path {
                key: key.to_string(),
                segment: segment.to_string(),
                reason,
            };
            let Some(owner) = ty.as_named().filter(|_| adapter.catalog().is_dto(&ty)) else {
                return Err(fail(format!("{ty} has no properties")));
            };
            let member = adapter.resolve(owner, segment).map_err(|e| fail(e.to_string()))?;
            end_point.extend(member.source.path);
            ty = member.dto_type;
        }
        Ok(Self { end_point, ty })
    }

    /// The scalar type of the resolved field.
    pub fn scalar(&self, key: &str) -> Result<ScalarType, CompileError> {
        self.ty.as_scalar().ok_or_else(|| CompileError::Path {
            key: key.to_string(),
            segment: Self::segments(key).last().unwrap_or_default().to_string(),
            reason: format!("{} is not a scalar", self.ty),
        })
    }
}

/// Origin entity of a DTO.
pub(crate) fn origin(adapter: &MappingAdapter, dto_type: &str) -> Result<String, MappingError> {
    let descriptor = adapter.catalog().require(dto_type)?;
    descriptor
        .origin()
        .map(str::to_string)
        .ok_or_else(|| MappingError::NotDto(dto_type.to_string()))
}

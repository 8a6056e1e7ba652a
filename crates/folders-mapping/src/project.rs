//! Read-DTO projection from loaded entity graphs.

use crate::adapter::MappingAdapter;
use crate::error::MappingError;
use crate::types::TypeRef;
use serde_json::{Map, Value};

/// Navigation depth followed when computing include paths.
const MAX_INCLUDE_DEPTH: usize = 4;

/// Materializes read DTOs from source records whose navigation properties
/// were eagerly loaded.
#[derive(Debug, Clone)]
pub struct Projector {
    adapter: MappingAdapter,
}

impl Projector {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    /// Projects `source` into the read DTO `dto_type`.
    ///
    /// Member chains that cross a missing navigation yield `null`.
    pub fn project(&self, dto_type: &str, source: &Value) -> Result<Value, MappingError> {
        let descriptor = self.adapter.catalog().require(dto_type)?;
        let mut dto = Map::new();
        for property in descriptor.properties.values() {
            let member = self.adapter.resolve(dto_type, &property.name)?;
            let raw = member
                .source
                .path
                .iter()
                .try_fold(source, |value, step| value.get(step))
                .unwrap_or(&Value::Null);
            dto.insert(property.name.clone(), self.project_value(&property.ty, raw)?);
        }
        Ok(Value::Object(dto))
    }

    fn project_value(&self, ty: &TypeRef, raw: &Value) -> Result<Value, MappingError> {
        match (ty, raw) {
            (_, Value::Null) if ty.is_collection() => Ok(Value::Array(Vec::new())),
            (_, Value::Null) => Ok(Value::Null),
            (TypeRef::Named(name), Value::Object(_)) if self.adapter.catalog().is_dto(ty) => {
                self.project(name, raw)
            }
            (TypeRef::Collection(element), Value::Array(items)) => items
                .iter()
                .map(|item| self.project_value(element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Ok(raw.clone()),
        }
    }

    /// Dotted navigation paths on the origin entity that must be eagerly
    /// loaded to project `dto_type`.
    pub fn include_paths(&self, dto_type: &str) -> Result<Vec<String>, MappingError> {
        let mut paths = Vec::new();
        self.collect_includes(dto_type, "", 0, &mut paths)?;
        Ok(paths)
    }

    fn collect_includes(
        &self,
        dto_type: &str,
        prefix: &str,
        depth: usize,
        paths: &mut Vec<String>,
    ) -> Result<(), MappingError> {
        if depth >= MAX_INCLUDE_DEPTH {
            return Ok(());
        }
        let catalog = self.adapter.catalog();
        let descriptor = catalog.require(dto_type)?;
        let Some(origin) = descriptor.origin() else {
            return Err(MappingError::NotDto(dto_type.to_string()));
        };
        for property in descriptor.properties.values() {
            let member = self.adapter.resolve(dto_type, &property.name)?;
            let mut entity = origin.to_string();
            let mut path = prefix.to_string();
            for step in &member.source.path {
                let source = self.adapter.entity_property(&entity, step)?;
                if !source.is_navigation() {
                    break;
                }
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(step);
                if !paths.contains(&path) {
                    paths.push(path.clone());
                }
                let target = source.ty.element().unwrap_or(&source.ty);
                match target.as_named() {
                    Some(name) => entity = name.to_string(),
                    None => break,
                }
            }
            let element = property.ty.element().unwrap_or(&property.ty);
            if let (true, Some(nested)) = (catalog.is_dto(element), element.as_named()) {
                self.collect_includes(nested, &path, depth + 1, paths)?;
            }
        }
        Ok(())
    }
}

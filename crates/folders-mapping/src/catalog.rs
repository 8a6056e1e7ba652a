//! The type-keyed descriptor table.

use crate::descriptor::{Relation, TypeDescriptor, TypeRole};
use crate::error::MappingError;
use crate::types::TypeRef;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Immutable table of every registered type, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: IndexMap<String, TypeDescriptor>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&TypeDescriptor, MappingError> {
        self.get(name)
            .ok_or_else(|| MappingError::UnknownType(name.to_string()))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// True when `ty` names a registered DTO.
    pub fn is_dto(&self, ty: &TypeRef) -> bool {
        ty.as_named()
            .and_then(|name| self.get(name))
            .is_some_and(TypeDescriptor::is_dto)
    }

    /// True when `ty` is a collection of registered DTOs.
    pub fn is_dto_collection(&self, ty: &TypeRef) -> bool {
        ty.element().is_some_and(|element| self.is_dto(element))
    }

    /// A blank instance of `name`: scalars and references `null`,
    /// collections empty.
    pub fn blank(&self, name: &str) -> Result<Value, MappingError> {
        let descriptor = self.require(name)?;
        let mut object = Map::new();
        for property in descriptor.properties.values() {
            let value = if property.ty.is_collection() {
                Value::Array(Vec::new())
            } else {
                Value::Null
            };
            object.insert(property.name.clone(), value);
        }
        Ok(Value::Object(object))
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: IndexMap<String, TypeDescriptor>,
}

impl CatalogBuilder {
    pub fn register(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Checks cross references and freezes the table.
    ///
    /// # Errors
    ///
    /// `InvalidCatalog` when a DTO's origin is not a registered entity, a
    /// property names an unregistered type, or a relation does not fit its
    /// property type.
    pub fn build(mut self) -> Result<Catalog, MappingError> {
        let origin_keys: Vec<(String, String)> = self
            .types
            .values()
            .filter_map(|descriptor| {
                let origin = self.types.get(descriptor.origin()?)?;
                Some((descriptor.name.clone(), origin.key.clone()))
            })
            .collect();
        for (name, key) in origin_keys {
            if let Some(descriptor) = self.types.get_mut(&name) {
                descriptor.key = key;
            }
        }
        let catalog = Catalog { types: self.types };
        for descriptor in catalog.types() {
            check_descriptor(&catalog, descriptor)?;
        }
        tracing::debug!(types = catalog.types.len(), "type catalog built");
        Ok(catalog)
    }
}

fn check_descriptor(catalog: &Catalog, descriptor: &TypeDescriptor) -> Result<(), MappingError> {
    let invalid = |reason: String| MappingError::InvalidCatalog(format!("{}: {reason}", descriptor.name));

    match &descriptor.role {
        TypeRole::Entity => {}
        TypeRole::ReadDto { origin } | TypeRole::EditDto { origin } => match catalog.get(origin) {
            Some(target) if target.role == TypeRole::Entity => {}
            _ => return Err(invalid(format!("origin '{origin}' is not a registered entity"))),
        },
    }

    for property in descriptor.properties.values() {
        let element = property.ty.element().unwrap_or(&property.ty);
        if let Some(name) = element.as_named() {
            if catalog.get(name).is_none() {
                return Err(invalid(format!(
                    "property '{}' refers to unknown type '{name}'",
                    property.name
                )));
            }
        }
        let fits = match &property.relation {
            None => true,
            Some(Relation::Reference { .. }) => property.ty.as_named().is_some(),
            Some(Relation::OneToMany { .. }) | Some(Relation::ManyToMany { .. }) => {
                property.ty.element().and_then(TypeRef::as_named).is_some()
            }
        };
        if !fits {
            return Err(invalid(format!(
                "relation of '{}' does not fit type {}",
                property.name, property.ty
            )));
        }
        if property.relation.is_some() && descriptor.is_dto() {
            return Err(invalid(format!(
                "DTO property '{}' declares a storage relation",
                property.name
            )));
        }
    }
    Ok(())
}

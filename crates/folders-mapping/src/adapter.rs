//! Role-aware property resolution.

use crate::catalog::Catalog;
use crate::descriptor::{PropertyDescriptor, Relation, TypeDescriptor, TypeRole};
use crate::error::MappingError;
use crate::registry::{MappingRegistry, SourceMember};
use crate::types::TypeRef;
use std::fmt;
use std::sync::Arc;

/// A DTO property together with the source member it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    pub dto_property: String,
    /// Declared type of the DTO property.
    pub dto_type: TypeRef,
    pub source: SourceMember,
}

/// The single lookup point for DTO → source resolution.
///
/// Read DTOs resolve forward, edit DTOs resolve in reverse against their
/// origin. Cheap to clone.
#[derive(Clone)]
pub struct MappingAdapter {
    catalog: Arc<Catalog>,
    registry: Arc<dyn MappingRegistry>,
}

impl fmt::Debug for MappingAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingAdapter")
            .field("types", &self.catalog.types().count())
            .finish_non_exhaustive()
    }
}

impl MappingAdapter {
    pub fn new(catalog: Arc<Catalog>, registry: Arc<dyn MappingRegistry>) -> Self {
        Self { catalog, registry }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolves `property` of the DTO named `dto_type`.
    pub fn resolve(&self, dto_type: &str, property: &str) -> Result<ResolvedMember, MappingError> {
        let descriptor = self.catalog.require(dto_type)?;
        let declared = descriptor
            .get(property)
            .ok_or_else(|| MappingError::not_found(dto_type, property))?;
        let source = match &descriptor.role {
            TypeRole::Entity => return Err(MappingError::NotDto(dto_type.to_string())),
            TypeRole::ReadDto { .. } => self.registry.resolve_forward(dto_type, property),
            TypeRole::EditDto { origin } => {
                self.registry.resolve_reverse(dto_type, origin, property)
            }
        }
        .ok_or_else(|| MappingError::not_found(dto_type, property))?;
        tracing::trace!(dto_type, property, source = ?source.path, "resolved member");
        Ok(ResolvedMember {
            dto_property: property.to_string(),
            dto_type: declared.ty.clone(),
            source,
        })
    }

    /// The source type a DTO type reference projects from: named DTOs map to
    /// their origin, collections map element-wise, scalars map to themselves.
    pub fn source_type(&self, dto: &TypeRef) -> Result<TypeRef, MappingError> {
        match dto {
            TypeRef::Scalar(_) => Ok(dto.clone()),
            TypeRef::Collection(element) => Ok(TypeRef::collection_of(self.source_type(element)?)),
            TypeRef::Named(name) => {
                let descriptor = self.catalog.require(name)?;
                Ok(TypeRef::named(descriptor.origin().unwrap_or(name)))
            }
        }
    }

    /// Descriptor of a registered entity.
    pub fn entity(&self, name: &str) -> Result<&TypeDescriptor, MappingError> {
        let descriptor = self.catalog.require(name)?;
        if descriptor.is_dto() {
            return Err(MappingError::InvalidCatalog(format!("{name} is not an entity")));
        }
        Ok(descriptor)
    }

    /// Source property `member` of entity `entity`.
    pub fn entity_property(
        &self,
        entity: &str,
        member: &str,
    ) -> Result<&PropertyDescriptor, MappingError> {
        self.entity(entity)?
            .get(member)
            .ok_or_else(|| MappingError::not_found(entity, member))
    }

    /// Storage relation of `entity.member`, if it is a navigation property.
    pub fn relation(&self, entity: &str, member: &str) -> Result<Option<&Relation>, MappingError> {
        Ok(self.entity_property(entity, member)?.relation.as_ref())
    }
}

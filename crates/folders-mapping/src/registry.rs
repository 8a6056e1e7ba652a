//! DTO property ↔ source member correspondence.

use crate::catalog::Catalog;
use crate::error::MappingError;
use crate::types::TypeRef;
use std::collections::HashMap;
use std::sync::Arc;

/// The source member a DTO property maps to: a member chain on the origin
/// entity plus the chain's terminal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMember {
    pub path: Vec<String>,
    pub ty: TypeRef,
}

impl SourceMember {
    /// Terminal member name.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Read-only mapping metadata, queried by type and property name.
pub trait MappingRegistry: Send + Sync {
    /// Read direction: which source member feeds `dto_type.property`.
    fn resolve_forward(&self, dto_type: &str, property: &str) -> Option<SourceMember>;

    /// Write direction: which member of `origin_type` receives
    /// `edit_dto_type.property`. Always a single member.
    fn resolve_reverse(
        &self,
        edit_dto_type: &str,
        origin_type: &str,
        property: &str,
    ) -> Option<SourceMember>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemberMap {
    /// `dto.property ← origin.member`
    Member(String),
    /// `dto.property ← origin.a.b.c`
    Path(Vec<String>),
}

/// In-process [`MappingRegistry`].
///
/// Properties without an explicit entry map by name. Path mappings are
/// honored forward; in reverse only when they reduce to a single member.
#[derive(Debug, Clone)]
pub struct Mappings {
    catalog: Arc<Catalog>,
    members: HashMap<(String, String), MemberMap>,
}

impl Mappings {
    pub fn builder(catalog: Arc<Catalog>) -> MappingsBuilder {
        MappingsBuilder {
            catalog,
            members: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn entry(&self, dto_type: &str, property: &str) -> Option<&MemberMap> {
        self.members
            .get(&(dto_type.to_string(), property.to_string()))
    }

    /// Walks a member chain on `entity` and returns its terminal type.
    /// Only the last step may be a collection.
    fn member_type(&self, entity: &str, path: &[String]) -> Option<TypeRef> {
        let mut current = entity.to_string();
        let mut ty = None;
        for (i, step) in path.iter().enumerate() {
            let property = self.catalog.get(&current)?.get(step)?;
            if i + 1 < path.len() {
                current = property.ty.as_named()?.to_string();
            }
            ty = Some(property.ty.clone());
        }
        ty
    }

    fn declares(&self, dto_type: &str, property: &str) -> bool {
        self.catalog
            .get(dto_type)
            .is_some_and(|d| d.get(property).is_some())
    }
}

impl MappingRegistry for Mappings {
    fn resolve_forward(&self, dto_type: &str, property: &str) -> Option<SourceMember> {
        if !self.declares(dto_type, property) {
            return None;
        }
        let origin = self.catalog.get(dto_type)?.origin()?;
        let path = match self.entry(dto_type, property) {
            Some(MemberMap::Member(member)) => vec![member.clone()],
            Some(MemberMap::Path(path)) => path.clone(),
            None => vec![property.to_string()],
        };
        let ty = self.member_type(origin, &path)?;
        Some(SourceMember { path, ty })
    }

    fn resolve_reverse(
        &self,
        edit_dto_type: &str,
        origin_type: &str,
        property: &str,
    ) -> Option<SourceMember> {
        if !self.declares(edit_dto_type, property) {
            return None;
        }
        let member = match self.entry(edit_dto_type, property) {
            Some(MemberMap::Member(member)) => member.clone(),
            Some(MemberMap::Path(path)) if path.len() == 1 => path[0].clone(),
            Some(MemberMap::Path(_)) => return None,
            None => property.to_string(),
        };
        let path = vec![member];
        let ty = self.member_type(origin_type, &path)?;
        Some(SourceMember { path, ty })
    }
}

pub struct MappingsBuilder {
    catalog: Arc<Catalog>,
    members: HashMap<(String, String), MemberMap>,
}

impl MappingsBuilder {
    /// `dto_type.property` maps to `origin.member`.
    pub fn map_member(
        mut self,
        dto_type: impl Into<String>,
        property: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        self.members
            .insert((dto_type.into(), property.into()), MemberMap::Member(member.into()));
        self
    }

    /// `dto_type.property` maps to the dotted member chain `path`.
    pub fn map_path(
        mut self,
        dto_type: impl Into<String>,
        property: impl Into<String>,
        path: &str,
    ) -> Self {
        let steps = path.split('.').map(str::to_string).collect();
        self.members
            .insert((dto_type.into(), property.into()), MemberMap::Path(steps));
        self
    }

    /// Checks every explicit entry against the catalog.
    ///
    /// # Errors
    ///
    /// `InvalidMapping` when the DTO does not declare the property or the
    /// member chain does not exist on the origin.
    pub fn build(self) -> Result<Mappings, MappingError> {
        let mappings = Mappings {
            catalog: self.catalog,
            members: self.members,
        };
        for ((dto_type, property), entry) in &mappings.members {
            let invalid = |reason: &str| MappingError::InvalidMapping {
                ty: dto_type.clone(),
                property: property.clone(),
                reason: reason.to_string(),
            };
            let descriptor = mappings.catalog.require(dto_type)?;
            let origin = descriptor.origin().ok_or_else(|| invalid("not a DTO"))?;
            if descriptor.get(property).is_none() {
                return Err(invalid("property is not declared"));
            }
            let path = match entry {
                MemberMap::Member(member) => std::slice::from_ref(member),
                MemberMap::Path(path) => path.as_slice(),
            };
            if mappings.member_type(origin, path).is_none() {
                return Err(invalid("member does not exist on the origin type"));
            }
        }
        Ok(mappings)
    }
}

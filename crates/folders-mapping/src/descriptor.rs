//! Per-type descriptors.
//!
//! A [`TypeDescriptor`] replaces reflection: it is the only place the engine
//! learns a type's origin, its properties, how relationships are stored, which
//! DTO properties may be filtered on, how a bare scalar converts into the
//! origin type, and which validator guards edits.

use crate::scalar::ScalarType;
use crate::types::TypeRef;
use crate::validation::DtoValidator;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a registered type is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRole {
    /// A persisted source entity.
    Entity,
    /// A DTO projected from `origin` (resolved forward).
    ReadDto { origin: String },
    /// A DTO whose edits are written back into `origin` (resolved in reverse).
    EditDto { origin: String },
}

impl TypeRole {
    pub fn origin(&self) -> Option<&str> {
        match self {
            TypeRole::Entity => None,
            TypeRole::ReadDto { origin } | TypeRole::EditDto { origin } => Some(origin),
        }
    }

    pub fn is_dto(&self) -> bool {
        !matches!(self, TypeRole::Entity)
    }
}

/// Comparison semantics selected by a `Filterable` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMethod {
    #[default]
    Undefined,
    /// Equality / range tests on the resolved field.
    Equals,
    /// Equality on the foreign-key scalar behind a navigation property.
    ById,
    /// Existential test over a collection's elements.
    Nested,
}

/// Compile-time filter metadata on a DTO property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filterable {
    pub compare_method: CompareMethod,
}

/// Join table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkTable {
    pub name: String,
    /// Column holding the owning entity's key.
    pub owner_key: String,
    /// Column holding the target entity's key.
    pub target_key: String,
}

impl LinkTable {
    pub fn new(
        name: impl Into<String>,
        owner_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner_key: owner_key.into(),
            target_key: target_key.into(),
        }
    }
}

/// How a navigation property is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Single target; the owner row carries `foreign_key`.
    Reference { foreign_key: String },
    /// Owned children; each child row carries `inverse_key`.
    OneToMany { inverse_key: String },
    /// Independent targets joined through `link`; edits only touch link rows.
    ManyToMany { link: LinkTable },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Reference,
    OneToMany,
    ManyToMany,
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::Reference { .. } => RelationKind::Reference,
            Relation::OneToMany { .. } => RelationKind::OneToMany,
            Relation::ManyToMany { .. } => RelationKind::ManyToMany,
        }
    }

    /// Adds and removes through this relation only create or delete link rows.
    pub fn is_link_only(&self) -> bool {
        self.kind() == RelationKind::ManyToMany
    }
}

/// One property of a registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeRef,
    /// Storage of navigation properties on entities.
    pub relation: Option<Relation>,
    /// Filter declaration on DTO properties.
    pub filterable: Option<Filterable>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            relation: None,
            filterable: None,
        }
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, TypeRef::Scalar(scalar))
    }

    pub fn reference(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            relation: Some(Relation::Reference {
                foreign_key: foreign_key.into(),
            }),
            ..Self::new(name, TypeRef::named(target))
        }
    }

    pub fn one_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        inverse_key: impl Into<String>,
    ) -> Self {
        Self {
            relation: Some(Relation::OneToMany {
                inverse_key: inverse_key.into(),
            }),
            ..Self::new(name, TypeRef::collection_of(TypeRef::named(target)))
        }
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>, link: LinkTable) -> Self {
        Self {
            relation: Some(Relation::ManyToMany { link }),
            ..Self::new(name, TypeRef::collection_of(TypeRef::named(target)))
        }
    }

    /// Marks the property filterable with `compare_method`.
    pub fn filterable(mut self, compare_method: CompareMethod) -> Self {
        self.filterable = Some(Filterable { compare_method });
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.relation.is_some()
    }
}

/// A declared conversion from a bare scalar payload into the origin type,
/// e.g. a channel id into `{"id": n}`.
#[derive(Clone, Copy)]
pub struct Conversion {
    pub from: ScalarType,
    pub convert: fn(&Value) -> Option<Value>,
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion").field("from", &self.from).finish()
    }
}

/// Everything the engine knows about one type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub role: TypeRole,
    /// Key property of entities; DTOs copy their origin's key name.
    pub key: String,
    pub properties: IndexMap<String, PropertyDescriptor>,
    pub conversions: Vec<Conversion>,
    pub validator: Option<Arc<dyn DtoValidator>>,
}

impl TypeDescriptor {
    fn with_role(name: impl Into<String>, role: TypeRole) -> Self {
        Self {
            name: name.into(),
            role,
            key: "id".to_string(),
            properties: IndexMap::new(),
            conversions: Vec::new(),
            validator: None,
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::with_role(name, TypeRole::Entity)
    }

    pub fn read_dto(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::with_role(
            name,
            TypeRole::ReadDto {
                origin: origin.into(),
            },
        )
    }

    pub fn edit_dto(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::with_role(
            name,
            TypeRole::EditDto {
                origin: origin.into(),
            },
        )
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    pub fn conversion(mut self, from: ScalarType, convert: fn(&Value) -> Option<Value>) -> Self {
        self.conversions.push(Conversion { from, convert });
        self
    }

    pub fn validator(mut self, validator: impl DtoValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn get(&self, property: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(property)
    }

    pub fn origin(&self) -> Option<&str> {
        self.role.origin()
    }

    pub fn is_dto(&self) -> bool {
        self.role.is_dto()
    }

    pub fn conversion_from(&self, scalar: ScalarType) -> Option<&Conversion> {
        self.conversions.iter().find(|c| c.from == scalar)
    }
}

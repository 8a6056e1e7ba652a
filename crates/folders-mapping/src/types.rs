//! Type references.

use crate::scalar::ScalarType;
use std::fmt;

/// The declared type of a property: a scalar, a registered named type, or a
/// collection of either.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Scalar(ScalarType),
    Named(String),
    Collection(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn collection_of(element: TypeRef) -> Self {
        TypeRef::Collection(Box::new(element))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::Collection(_))
    }

    /// Element type of a collection.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Collection(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            TypeRef::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }
}

impl From<ScalarType> for TypeRef {
    fn from(scalar: ScalarType) -> Self {
        TypeRef::Scalar(scalar)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(scalar) => write!(f, "{scalar}"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Collection(inner) => write!(f, "Collection<{inner}>"),
        }
    }
}

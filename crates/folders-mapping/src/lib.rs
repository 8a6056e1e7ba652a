//! Declarative DTO ↔ entity metadata.
//!
//! Everything the patch engine and the query compilers know about a type
//! comes from here:
//!
//! - [`Catalog`]: a type-keyed table of [`TypeDescriptor`]s, built once at
//!   startup. A descriptor names the type's role (entity, read DTO, edit DTO),
//!   its origin entity, its properties with their [`TypeRef`]s, relationship
//!   kinds, `Filterable` declarations, scalar conversions and validator.
//! - [`MappingRegistry`]: DTO property → source member correspondence
//!   (forward for read DTOs, reverse for edit DTOs). [`Mappings`] is the
//!   in-process implementation.
//! - [`MappingAdapter`]: picks forward or reverse resolution from the DTO's
//!   role; the single lookup point used by the engine.
//! - [`Projector`]: materializes read DTOs from loaded entity graphs.

pub mod adapter;
pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod project;
pub mod registry;
pub mod scalar;
pub mod types;
pub mod validation;

pub use adapter::{MappingAdapter, ResolvedMember};
pub use catalog::{Catalog, CatalogBuilder};
pub use descriptor::{
    CompareMethod, Conversion, Filterable, LinkTable, PropertyDescriptor, Relation, RelationKind,
    TypeDescriptor, TypeRole,
};
pub use error::MappingError;
pub use project::Projector;
pub use registry::{MappingRegistry, Mappings, MappingsBuilder, SourceMember};
pub use scalar::ScalarType;
pub use types::TypeRef;
pub use validation::{DtoValidator, FieldFailure, Rule, RuleValidator, ValidatorFault};

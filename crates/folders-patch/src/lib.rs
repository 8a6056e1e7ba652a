//! Partial updates of persisted entities through their DTOs.
//!
//! A patch document is an ordered list of `add` / `remove` / `replace`
//! operations whose paths follow a DTO's property shape and address
//! collection elements by id (`/7/notes/3`) or append with `-`. The engine
//! rewrites such documents into the shape of the source entity and applies
//! them transactionally:
//!
//! - [`PathTranslator`]: DTO path → source path plus the trace of
//!   traversed types.
//! - [`ValueCoercer`]: DTO-shaped payloads → source-shaped payloads.
//! - [`OperationConverter`]: both of the above over a whole document,
//!   errors reported against the DTO path the client sent.
//! - [`PatchApplier`]: one store session per document, strictly ordered,
//!   committed or rolled back as a whole.
//! - [`PatchValidator`]: static checks before any mutation.
//! - [`PatchEngine`]: the assembled pipeline.

pub mod apply;
pub mod codec;
pub mod coerce;
pub mod convert;
pub mod engine;
pub mod error;
pub mod position;
pub mod translate;
pub mod types;
pub mod validate;
pub mod validator;

pub use apply::{ApplyReport, PatchApplier};
pub use codec::json::{decode_document, encode_document, from_json, to_json};
pub use coerce::ValueCoercer;
pub use convert::OperationConverter;
pub use engine::PatchEngine;
pub use error::{ApplyCause, ApplyFailure, CoerceError, ConvertCause, ConvertError, PatchError, PathError};
pub use position::Position;
pub use translate::{PathTranslator, Translated};
pub use types::{OpKind, Operation, PatchOptions, PatchValue, PathTrace, SourceOperation, TraceStep};
pub use validator::PatchValidator;

//! Core types of the patch engine.

use folders_mapping::TypeRef;
use folders_pointer::{Path, PointerLimits};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ── Operations ────────────────────────────────────────────────────────────

/// Operation kinds of the wire vocabulary. Only `Add`, `Remove` and
/// `Replace` are applied; the rest decode so they can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
            OpKind::Copy => "copy",
            OpKind::Move => "move",
            OpKind::Test => "test",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(OpKind::Add),
            "remove" => Some(OpKind::Remove),
            "replace" => Some(OpKind::Replace),
            "copy" => Some(OpKind::Copy),
            "move" => Some(OpKind::Move),
            "test" => Some(OpKind::Test),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, OpKind::Add | OpKind::Remove | OpKind::Replace)
    }

    /// Whether the operation carries a `value`.
    pub fn takes_value(&self) -> bool {
        matches!(self, OpKind::Add | OpKind::Replace | OpKind::Test)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One DTO-space operation as received.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op: OpKind,
    /// DTO-relative path, as sent by the client.
    pub path: String,
    pub value: Option<Value>,
    pub from: Option<String>,
}

impl Operation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OpKind::Add,
            path: path.into(),
            value: Some(value),
            from: None,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: OpKind::Remove,
            path: path.into(),
            value: None,
            from: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: OpKind::Replace,
            path: path.into(),
            value: Some(value),
            from: None,
        }
    }
}

/// Tagged view of an operation payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatchValue<'a> {
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
    /// Strings, numbers, booleans and `null`.
    Scalar(&'a Value),
}

impl<'a> PatchValue<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => PatchValue::Object(map),
            Value::Array(items) => PatchValue::Array(items),
            scalar => PatchValue::Scalar(scalar),
        }
    }
}

// ── Path traces ───────────────────────────────────────────────────────────

/// One resolved level of a translated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// DTO-side type at this level.
    pub dto: TypeRef,
    /// Source-side type at this level.
    pub source: TypeRef,
    /// Reached through an element id or the end-marker.
    pub is_collection_element: bool,
}

/// The chain of types a path walks through, root first. Always one step
/// longer than the path it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTrace(pub(crate) Vec<TraceStep>);

impl PathTrace {
    pub(crate) fn new(root: TraceStep) -> Self {
        PathTrace(vec![root])
    }

    pub(crate) fn push(&mut self, step: TraceStep) {
        self.0.push(step);
    }

    pub fn root(&self) -> &TraceStep {
        &self.0[0]
    }

    pub fn last(&self) -> &TraceStep {
        &self.0[self.0.len() - 1]
    }

    /// The step before the last one; `None` for a root-only trace.
    pub fn parent(&self) -> Option<&TraceStep> {
        self.0.len().checked_sub(2).map(|i| &self.0[i])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.0
    }
}

/// An operation rewritten into source space.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOperation {
    pub op: OpKind,
    /// The path the client sent, for error reports.
    pub dto_path: String,
    /// Source-space path including the leading element component.
    pub path: Path,
    /// Source-shaped payload.
    pub value: Option<Value>,
    /// Trace of the path below the leading element component.
    pub trace: PathTrace,
}

// ── Options ───────────────────────────────────────────────────────────────

/// Limits applied to incoming documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PatchOptions {
    /// Operations per document.
    pub max_operations: usize,
    pub max_path_length: usize,
    pub max_path_depth: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        let limits = PointerLimits::default();
        Self {
            max_operations: 100,
            max_path_length: limits.max_pointer_length,
            max_path_depth: limits.max_depth,
        }
    }
}

impl PatchOptions {
    pub fn pointer_limits(&self) -> PointerLimits {
        PointerLimits {
            max_pointer_length: self.max_path_length,
            max_depth: self.max_path_depth,
        }
    }
}

//! DTO path → source path translation.

use crate::error::PathError;
use crate::types::{PathTrace, TraceStep};
use folders_mapping::{MappingAdapter, TypeRef};
use folders_pointer::{is_element_step, parse_normalized, Path};

/// A translated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub source_path: Path,
    pub trace: PathTrace,
}

/// Resolves DTO paths segment by segment through the [`MappingAdapter`].
#[derive(Debug, Clone)]
pub struct PathTranslator {
    adapter: MappingAdapter,
}

impl PathTranslator {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    /// Translates `dto_path` relative to `root`.
    ///
    /// Element components (ids, the end-marker) below a collection pass
    /// through unchanged; every other component is resolved against the
    /// current DTO type. The empty path resolves to itself.
    pub fn translate(&self, dto_path: &str, root: &TypeRef) -> Result<Translated, PathError> {
        let steps = parse_normalized(dto_path);
        self.translate_steps(dto_path, &steps, root)
    }

    /// Translates already parsed `steps`; `full_path` is only used in errors.
    pub fn translate_steps(
        &self,
        full_path: &str,
        steps: &[String],
        root: &TypeRef,
    ) -> Result<Translated, PathError> {
        let fail = |segment: &str, reason: String| PathError {
            path: full_path.to_string(),
            segment: segment.to_string(),
            reason,
        };
        let source_root = self
            .adapter
            .source_type(root)
            .map_err(|e| fail("", e.to_string()))?;
        let mut trace = PathTrace::new(TraceStep {
            dto: root.clone(),
            source: source_root,
            is_collection_element: false,
        });
        let mut source_path = Vec::with_capacity(steps.len());

        for step in steps {
            let current = trace.last().clone();
            if let (Some(dto), Some(source)) = (current.dto.element(), current.source.element()) {
                if !is_element_step(step) {
                    return Err(fail(step, "expected an element id or '-'".to_string()));
                }
                trace.push(TraceStep {
                    dto: dto.clone(),
                    source: source.clone(),
                    is_collection_element: true,
                });
                source_path.push(step.clone());
                continue;
            }
            let Some(dto_type) = current.dto.as_named() else {
                return Err(fail(step, format!("{} has no properties", current.dto)));
            };
            let member = self
                .adapter
                .resolve(dto_type, step)
                .map_err(|e| fail(step, e.to_string()))?;
            source_path.push(member.source.name().to_string());
            trace.push(TraceStep {
                dto: member.dto_type,
                source: member.source.ty,
                is_collection_element: false,
            });
        }
        tracing::trace!(dto_path = full_path, ?source_path, "path translated");
        Ok(Translated { source_path, trace })
    }
}

//! Whole-document rewriting from DTO space into source space.

use crate::coerce::ValueCoercer;
use crate::error::{ConvertCause, ConvertError};
use crate::translate::{PathTranslator, Translated};
use crate::types::{OpKind, Operation, SourceOperation};
use folders_mapping::{MappingAdapter, TypeRef};
use folders_pointer::{parse_normalized, split_element_prefix};

#[derive(Debug, Clone)]
pub struct OperationConverter {
    translator: PathTranslator,
    coercer: ValueCoercer,
}

impl OperationConverter {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self {
            translator: PathTranslator::new(adapter.clone()),
            coercer: ValueCoercer::new(adapter),
        }
    }

    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }

    pub fn coercer(&self) -> &ValueCoercer {
        &self.coercer
    }

    /// Converts every operation of a document addressed at a collection of
    /// `root_dto`. Stops at the first failure.
    pub fn convert(
        &self,
        document: &[Operation],
        root_dto: &str,
    ) -> Result<Vec<SourceOperation>, ConvertError> {
        document
            .iter()
            .enumerate()
            .map(|(index, op)| {
                self.convert_operation(op, root_dto).map_err(|cause| ConvertError {
                    index,
                    path: op.path.clone(),
                    cause,
                })
            })
            .collect()
    }

    /// Converts one operation. A leading element component addresses the
    /// entity collection and is kept as-is; the remainder is translated
    /// relative to `root_dto`.
    pub fn convert_operation(
        &self,
        op: &Operation,
        root_dto: &str,
    ) -> Result<SourceOperation, ConvertCause> {
        let Translated { source_path, trace } = self.translate(op, root_dto)?;
        let value = match (op.op, &op.value) {
            (OpKind::Remove, _) => None,
            (_, Some(value)) => Some(self.coercer.coerce(value, &trace)?),
            (kind, None) if kind.takes_value() => return Err(ConvertCause::MissingValue),
            (_, None) => None,
        };
        tracing::debug!(
            op = %op.op,
            dto_path = %op.path,
            source_path = ?source_path,
            "operation converted"
        );
        Ok(SourceOperation {
            op: op.op,
            dto_path: op.path.clone(),
            path: source_path,
            value,
            trace,
        })
    }

    /// Translates the path of `op`, keeping the element prefix in front.
    pub fn translate(&self, op: &Operation, root_dto: &str) -> Result<Translated, ConvertCause> {
        let steps = parse_normalized(&op.path);
        let (prefix, rest) = split_element_prefix(&steps);
        let mut translated =
            self.translator
                .translate_steps(&op.path, rest, &TypeRef::named(root_dto))?;
        if let Some(prefix) = prefix {
            translated.source_path.insert(0, prefix.to_string());
        }
        Ok(translated)
    }
}

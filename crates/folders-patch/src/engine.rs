//! The decode → validate → convert → apply pipeline.

use crate::apply::{ApplyReport, PatchApplier};
use crate::codec::json::decode_document;
use crate::convert::OperationConverter;
use crate::error::{ApplyFailure, ConvertError, PatchError};
use crate::types::{Operation, PatchOptions, SourceOperation};
use crate::validate::ValidationError;
use crate::validator::PatchValidator;
use folders_mapping::{FieldFailure, MappingAdapter};
use folders_store::EntityStore;
use serde_json::Value;

/// Immutable once built; share it by reference.
#[derive(Debug, Clone)]
pub struct PatchEngine {
    options: PatchOptions,
    converter: OperationConverter,
    validator: PatchValidator,
    applier: PatchApplier,
}

impl PatchEngine {
    pub fn new(adapter: MappingAdapter, options: PatchOptions) -> Self {
        Self {
            options,
            converter: OperationConverter::new(adapter.clone()),
            validator: PatchValidator::new(adapter.clone()),
            applier: PatchApplier::new(adapter),
        }
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    pub fn decode(&self, document: &Value) -> Result<Vec<Operation>, ValidationError> {
        decode_document(document, &self.options)
    }

    pub fn validate(&self, document: &[Operation], root_dto: &str) -> Vec<FieldFailure> {
        self.validator.validate(document, root_dto)
    }

    pub fn convert(
        &self,
        document: &[Operation],
        root_dto: &str,
    ) -> Result<Vec<SourceOperation>, ConvertError> {
        self.converter.convert(document, root_dto)
    }

    pub async fn apply<S: EntityStore>(
        &self,
        ops: &[SourceOperation],
        store: &S,
    ) -> Result<ApplyReport, ApplyFailure> {
        self.applier.apply(ops, store).await
    }

    /// Runs a raw document end to end against `store`.
    pub async fn patch<S: EntityStore>(
        &self,
        document: &Value,
        root_dto: &str,
        store: &S,
    ) -> Result<ApplyReport, PatchError> {
        let ops = self.decode(document)?;
        self.patch_operations(&ops, root_dto, store).await
    }

    /// Validates, converts and applies decoded operations.
    pub async fn patch_operations<S: EntityStore>(
        &self,
        ops: &[Operation],
        root_dto: &str,
        store: &S,
    ) -> Result<ApplyReport, PatchError> {
        let failures = self.validate(ops, root_dto);
        if !failures.is_empty() {
            tracing::debug!(root_dto, failures = failures.len(), "patch rejected");
            return Err(PatchError::Rejected(failures));
        }
        let source = self.convert(ops, root_dto)?;
        let report = self.apply(&source, store).await?;
        tracing::debug!(root_dto, operations = report.operations, affected = report.affected, "patch committed");
        Ok(report)
    }
}

//! Folder requests: authorize, then patch or list through the shared
//! engines.

use crate::auth::{Permission, Principal};
use crate::catalog::{FOLDER_DTO, FOLDER_EDIT_DTO};
use crate::engine::Engine;
use crate::error::ServiceError;
use folders_patch::{ApplyReport, OpKind, Operation, PatchError, SourceOperation};
use folders_pointer::{parse_normalized, Segment};
use folders_query::{ListPage, ListQuery, QueryError};
use folders_store::EntityStore;
use serde_json::Value;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

/// Column new folders are owned through.
const OWNER_KEY: &str = "ownerId";

#[derive(Debug, Clone)]
pub struct FolderService<'e, S> {
    engine: &'e Engine,
    store: S,
}

impl<'e, S: EntityStore> FolderService<'e, S> {
    pub fn new(engine: &'e Engine, store: S) -> Self {
        Self { engine, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn principal(&self, user_id: i64) -> Result<Principal, ServiceError> {
        Ok(Principal::load(&self.store, user_id).await?)
    }

    /// Applies a `FolderEditDto` patch document. Folders added at the root
    /// are owned by the principal.
    pub async fn patch_folders(&self, principal: &Principal, document: &Value) -> Result<ApplyReport, ServiceError> {
        principal.require(Permission::EditFolders)?;
        let patch = &self.engine.patch;

        let ops = patch.decode(document).map_err(PatchError::from)?;
        let failures = patch.validate(&ops, FOLDER_EDIT_DTO);
        if !failures.is_empty() {
            tracing::debug!(user = principal.user_id, failures = failures.len(), "folder patch rejected");
            return Err(PatchError::Rejected(failures).into());
        }
        principal.check_owner(&self.store, &addressed_folders(&ops)).await?;

        let mut source = patch.convert(&ops, FOLDER_EDIT_DTO).map_err(PatchError::from)?;
        for op in &mut source {
            assign_owner(op, principal.user_id);
        }
        let report = patch.apply(&source, &self.store).await.map_err(PatchError::from)?;
        tracing::info!(
            user = principal.user_id,
            operations = report.operations,
            affected = report.affected,
            "folders patched"
        );
        Ok(report)
    }

    /// Lists `FolderDto`s. Principals that can not manage users only see
    /// their own folders.
    pub async fn list_folders(
        &self,
        principal: &Principal,
        mut query: ListQuery,
        cancel: &CancellationToken,
    ) -> Result<ListPage, ServiceError> {
        principal.require(Permission::ReadFolders)?;
        let failures = self.engine.queries.validate(&mut query, FOLDER_DTO);
        if !failures.is_empty() {
            return Err(QueryError::Rejected(failures).into());
        }
        if !principal.sees_all() {
            query.filters.insert(0, self.engine.owner_filter(principal.user_id)?);
        }
        Ok(self
            .engine
            .executor
            .execute(&query, FOLDER_DTO, &self.store, cancel)
            .await?)
    }
}

/// Ids of the existing folders a document addresses.
fn addressed_folders(ops: &[Operation]) -> BTreeSet<i64> {
    ops.iter()
        .filter_map(|op| match parse_normalized(&op.path).first().map(|step| Segment::parse(step)) {
            Some(Segment::Id(id)) => Some(id),
            _ => None,
        })
        .collect()
}

fn assign_owner(op: &mut SourceOperation, user_id: i64) {
    if op.op != OpKind::Add || op.path.len() > 1 {
        return;
    }
    if let Some(Value::Object(folder)) = &mut op.value {
        folder.insert(OWNER_KEY.to_string(), Value::from(user_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_leading_ids_address_folders() {
        let ops = [
            Operation::replace("/3/name", json!("x")),
            Operation::add("/-", json!({"name": "y"})),
            Operation::remove("/5/channels/3"),
            Operation::add("", json!({"name": "z"})),
        ];
        assert_eq!(addressed_folders(&ops), BTreeSet::from([3, 5]));
    }
}

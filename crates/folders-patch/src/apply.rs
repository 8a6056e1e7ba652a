//! Transactional application of source-space operations.
//!
//! One document runs in one store session. Operations run in order; the
//! first failure rolls the session back and is reported with the index and
//! the DTO path of the failing operation.

use crate::error::{ApplyCause, ApplyFailure};
use crate::position::Position;
use crate::types::{OpKind, SourceOperation};
use folders_mapping::{MappingAdapter, Relation};
use folders_pointer::{is_element_step, Segment};
use folders_store::{EntityState, EntityStore, StoreSession};
use serde_json::{Map, Value};

/// Rows touched by a committed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub operations: usize,
    pub affected: u64,
}

/// A position inside a loaded entity graph.
#[derive(Debug)]
enum Node {
    Entity {
        entity: String,
        record: Value,
    },
    Collection {
        owner: String,
        owner_id: i64,
        property: String,
        relation: Relation,
        target: String,
        items: Vec<Value>,
    },
}

#[derive(Debug, Clone)]
pub struct PatchApplier {
    adapter: MappingAdapter,
}

impl PatchApplier {
    pub fn new(adapter: MappingAdapter) -> Self {
        Self { adapter }
    }

    /// Applies `ops` in one session: fully committed or fully rolled back.
    pub async fn apply<S: EntityStore>(
        &self,
        ops: &[SourceOperation],
        store: &S,
    ) -> Result<ApplyReport, ApplyFailure> {
        let failure = |index: usize, cause: ApplyCause| ApplyFailure {
            index,
            dto_path: ops.get(index).map(|op| op.dto_path.clone()).unwrap_or_default(),
            cause,
        };
        let mut session = store.begin().await.map_err(|e| failure(0, e.into()))?;
        let mut affected = 0;

        for (index, op) in ops.iter().enumerate() {
            match self.apply_operation(&mut session, op).await {
                Ok(rows) => {
                    tracing::debug!(index, op = %op.op, dto_path = %op.dto_path, rows, "operation applied");
                    affected += rows;
                }
                Err(cause) => {
                    if let ApplyCause::UnsupportedOperation(kind) = &cause {
                        tracing::error!(index, op = %kind, "unsupported operation reached the applier");
                    }
                    tracing::warn!(index, dto_path = %op.dto_path, %cause, "patch rolled back");
                    if let Err(e) = session.rollback().await {
                        tracing::warn!(error = %e, "rollback failed");
                    }
                    return Err(failure(index, cause));
                }
            }
        }

        let last = ops.len().saturating_sub(1);
        session.commit().await.map_err(|e| {
            tracing::warn!(error = %e, "patch commit failed");
            failure(last, e.into())
        })?;
        Ok(ApplyReport {
            operations: ops.len(),
            affected,
        })
    }

    async fn apply_operation<T: StoreSession>(
        &self,
        session: &mut T,
        op: &SourceOperation,
    ) -> Result<u64, ApplyCause> {
        let root = op
            .trace
            .root()
            .source
            .as_named()
            .ok_or_else(|| ApplyCause::UnsupportedTarget(op.trace.root().source.to_string()))?
            .to_string();
        match op.op {
            OpKind::Replace => self.replace(session, &root, op).await,
            OpKind::Add => self.add(session, &root, op).await,
            OpKind::Remove => self.remove(session, &root, op).await,
            other => Err(ApplyCause::UnsupportedOperation(other)),
        }
    }

    async fn replace<T: StoreSession>(
        &self,
        session: &mut T,
        root: &str,
        op: &SourceOperation,
    ) -> Result<u64, ApplyCause> {
        let value = op.value.as_ref().ok_or(ApplyCause::MissingValue)?;
        let Some((first, rest)) = op.path.split_first() else {
            return Err(ApplyCause::UnsupportedTarget(
                "the root collection can not be replaced".into(),
            ));
        };
        let id = element_id(first)?;

        let Some((leaf, walk)) = rest.split_last() else {
            self.update_columns(session, root, id, value)?;
            return Ok(session.save_changes().await?);
        };

        let direct_scalar = walk.is_empty()
            && self.adapter.entity_property(root, leaf)?.relation.is_none();
        if direct_scalar {
            self.set_column(session, root, id, leaf, value)?;
            return Ok(session.save_changes().await?);
        }

        let record = self.load(session, root, id, rest).await?;
        let mut node = Node::Entity {
            entity: root.to_string(),
            record,
        };
        for step in walk {
            node = self.descend(node, step)?;
        }

        match node {
            Node::Entity { entity, record } => {
                let owner_id = self.key_of(&entity, &record)?;
                let property = self.adapter.entity_property(&entity, leaf)?;
                match &property.relation {
                    None => self.set_column(session, &entity, owner_id, leaf, value)?,
                    Some(Relation::Reference { foreign_key }) => {
                        let target = property.ty.as_named().unwrap_or_default().to_string();
                        self.replace_reference(session, &entity, owner_id, foreign_key, &target, value)?;
                    }
                    Some(_) => {
                        return Err(ApplyCause::UnsupportedTarget(format!(
                            "collection '{leaf}' can not be replaced"
                        )))
                    }
                }
            }
            Node::Collection { target, items, .. } => {
                let key = self.key_name(&target)?;
                match Position::resolve(&items, &key, leaf, false) {
                    Position::Index(index) => {
                        let element_id = self.key_of(&target, &items[index])?;
                        self.update_columns(session, &target, element_id, value)?;
                    }
                    Position::Append | Position::OutOfBounds => {
                        return Err(missing_element(&target, leaf))
                    }
                }
            }
        }
        Ok(session.save_changes().await?)
    }

    /// Writes one scalar column. Keys are immutable.
    fn set_column<T: StoreSession>(
        &self,
        session: &mut T,
        entity: &str,
        id: i64,
        column: &str,
        value: &Value,
    ) -> Result<(), ApplyCause> {
        let mut stub = self.stub(entity, id)?;
        if stub.contains_key(column) {
            return Err(ApplyCause::UnsupportedTarget(format!(
                "key '{column}' of {entity} can not be replaced"
            )));
        }
        stub.insert(column.to_string(), value.clone());
        session.track(entity, stub, EntityState::Modified)?;
        Ok(())
    }

    /// Points `owner.foreign_key` at the replacement. Scalar columns carried
    /// by the replacement are written to the target as well.
    fn replace_reference<T: StoreSession>(
        &self,
        session: &mut T,
        owner: &str,
        owner_id: i64,
        foreign_key: &str,
        target: &str,
        value: &Value,
    ) -> Result<(), ApplyCause> {
        let mut stub = self.stub(owner, owner_id)?;
        match value {
            Value::Null => {
                stub.insert(foreign_key.to_string(), Value::Null);
            }
            Value::Object(object) => {
                let key = self.key_name(target)?;
                let target_id = object
                    .get(&key)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ApplyCause::UnsupportedTarget(format!("{target} without '{key}'")))?;
                stub.insert(foreign_key.to_string(), Value::from(target_id));
                if object.len() > 1 {
                    self.update_columns(session, target, target_id, value)?;
                }
            }
            other => {
                return Err(ApplyCause::UnsupportedTarget(format!(
                    "{other} is not a {target}"
                )))
            }
        }
        session.track(owner, stub, EntityState::Modified)?;
        Ok(())
    }

    async fn add<T: StoreSession>(
        &self,
        session: &mut T,
        root: &str,
        op: &SourceOperation,
    ) -> Result<u64, ApplyCause> {
        let value = op.value.as_ref().ok_or(ApplyCause::MissingValue)?;
        let Some((first, rest)) = op.path.split_first() else {
            self.insert_graph(session, root, value)?;
            return Ok(session.save_changes().await?);
        };

        if rest.is_empty() {
            match Segment::parse(first) {
                Segment::End => {}
                Segment::Id(id) => {
                    if session.load(root, id, &[]).await?.is_some() {
                        return Err(ApplyCause::AlreadyExists {
                            entity: root.to_string(),
                            id,
                        });
                    }
                }
                Segment::Key(key) => return Err(not_an_element(key)),
            }
            self.insert_graph(session, root, value)?;
            return Ok(session.save_changes().await?);
        }

        let id = element_id(first)?;
        let (last, middle) = rest.split_last().ok_or(ApplyCause::MissingTarget)?;
        let Some((collection, walk)) = middle.split_last() else {
            return Err(only_collections());
        };
        let record = self.load(session, root, id, rest).await?;
        let mut node = Node::Entity {
            entity: root.to_string(),
            record,
        };
        for step in walk {
            node = self.descend(node, step)?;
        }
        let Node::Collection {
            owner,
            owner_id,
            property,
            relation,
            target,
            items,
        } = self.descend(node, collection)?
        else {
            return Err(only_collections());
        };

        let key = self.key_name(&target)?;
        match Position::resolve(&items, &key, last, true) {
            Position::Index(index) => Err(ApplyCause::AlreadyExists {
                id: self.key_of(&target, &items[index])?,
                entity: target,
            }),
            Position::OutOfBounds => Err(ApplyCause::OutOfBounds(last.clone())),
            Position::Append => {
                match relation {
                    Relation::ManyToMany { .. } => {
                        let child_id = match value.get(&key).and_then(Value::as_i64) {
                            Some(child_id) => {
                                session.track(&owner, self.stub(&owner, owner_id)?, EntityState::Unchanged)?;
                                session.track(&target, self.stub(&target, child_id)?, EntityState::Unchanged)?;
                                child_id
                            }
                            None => self.insert_graph(session, &target, value)?,
                        };
                        session.append_to_collection(&owner, owner_id, &property, child_id)?;
                    }
                    Relation::OneToMany { inverse_key } => {
                        let mut child = value.as_object().cloned().ok_or_else(|| {
                            ApplyCause::UnsupportedTarget(format!("{value} is not a {target}"))
                        })?;
                        child.insert(inverse_key, Value::from(owner_id));
                        self.insert_graph(session, &target, &Value::Object(child))?;
                    }
                    Relation::Reference { .. } => return Err(only_collections()),
                }
                Ok(session.save_changes().await?)
            }
        }
    }

    async fn remove<T: StoreSession>(
        &self,
        session: &mut T,
        root: &str,
        op: &SourceOperation,
    ) -> Result<u64, ApplyCause> {
        let Some((first, rest)) = op.path.split_first() else {
            return Err(ApplyCause::UnsupportedTarget(
                "the root collection can not be removed".into(),
            ));
        };
        let id = element_id(first)?;
        let Some((last, middle)) = rest.split_last() else {
            session.track(root, self.stub(root, id)?, EntityState::Deleted)?;
            return Ok(session.save_changes().await?);
        };
        if middle.is_empty() {
            return Err(only_collections());
        }
        if Segment::parse(last) == Segment::End {
            return Err(ApplyCause::MissingTarget);
        }

        // The child must be an element of the addressed parent's collection.
        let record = self.load(session, root, id, rest).await?;
        let mut node = Node::Entity {
            entity: root.to_string(),
            record,
        };
        for step in middle {
            node = self.descend(node, step)?;
        }
        let Node::Collection {
            owner,
            owner_id,
            property,
            target,
            items,
            ..
        } = node
        else {
            return Err(only_collections());
        };
        let key = self.key_name(&target)?;
        let child_id = match Position::resolve(&items, &key, last, false) {
            Position::Index(index) => self.key_of(&target, &items[index])?,
            Position::Append | Position::OutOfBounds => return Err(missing_element(&target, last)),
        };

        session.track(&owner, self.stub(&owner, owner_id)?, EntityState::Unchanged)?;
        session.track(&target, self.stub(&target, child_id)?, EntityState::Unchanged)?;
        session.remove_from_collection(&owner, owner_id, &property, child_id)?;
        Ok(session.save_changes().await?)
    }

    /// Tracks `value` and everything it owns as new. Children reached
    /// through many-to-many relations are attached as existing when they
    /// carry a key; references that carry a key are pointed at.
    fn insert_graph<T: StoreSession>(
        &self,
        session: &mut T,
        entity: &str,
        value: &Value,
    ) -> Result<i64, ApplyCause> {
        let Value::Object(object) = value else {
            return Err(ApplyCause::UnsupportedTarget(format!("{value} is not a {entity}")));
        };
        let descriptor = self.adapter.entity(entity)?;
        let mut columns = Map::new();
        let mut owned = Vec::new();

        for (name, item) in object {
            let property = descriptor
                .get(name)
                .ok_or_else(|| ApplyCause::UnsupportedTarget(format!("{entity} has no member '{name}'")))?;
            let target = property
                .ty
                .element()
                .unwrap_or(&property.ty)
                .as_named()
                .unwrap_or_default();
            match &property.relation {
                None => {
                    columns.insert(name.clone(), item.clone());
                }
                Some(Relation::Reference { foreign_key }) => {
                    if item.is_null() {
                        continue;
                    }
                    let key = self.key_name(target)?;
                    let target_id = match item.get(&key).and_then(Value::as_i64) {
                        Some(target_id) => target_id,
                        None => self.insert_graph(session, target, item)?,
                    };
                    columns.insert(foreign_key.clone(), Value::from(target_id));
                }
                Some(relation) => owned.push((name, relation, target, item)),
            }
        }

        let id = session.track(entity, columns, EntityState::Added)?;
        for (name, relation, target, items) in owned {
            let items = items
                .as_array()
                .ok_or_else(|| ApplyCause::UnsupportedTarget(format!("'{name}' must be an array")))?;
            for item in items {
                match relation {
                    Relation::OneToMany { inverse_key } => {
                        let mut child = item.as_object().cloned().ok_or_else(|| {
                            ApplyCause::UnsupportedTarget(format!("{item} is not a {target}"))
                        })?;
                        child.insert(inverse_key.clone(), Value::from(id));
                        self.insert_graph(session, target, &Value::Object(child))?;
                    }
                    Relation::ManyToMany { .. } => {
                        let key = self.key_name(target)?;
                        let child_id = match item.get(&key).and_then(Value::as_i64) {
                            Some(child_id) => {
                                session.track(target, self.stub(target, child_id)?, EntityState::Unchanged)?
                            }
                            None => self.insert_graph(session, target, item)?,
                        };
                        session.append_to_collection(entity, id, name, child_id)?;
                    }
                    Relation::Reference { .. } => {}
                }
            }
        }
        Ok(id)
    }

    /// Writes the scalar columns of `value` onto `entity #id`.
    fn update_columns<T: StoreSession>(
        &self,
        session: &mut T,
        entity: &str,
        id: i64,
        value: &Value,
    ) -> Result<(), ApplyCause> {
        let Value::Object(object) = value else {
            return Err(ApplyCause::UnsupportedTarget(format!("{value} is not a {entity}")));
        };
        let descriptor = self.adapter.entity(entity)?;
        let mut stub = self.stub(entity, id)?;
        for (name, column) in object {
            if name == &descriptor.key {
                continue;
            }
            match descriptor.get(name) {
                Some(property) if property.relation.is_none() => {
                    stub.insert(name.clone(), column.clone());
                }
                _ => {
                    return Err(ApplyCause::UnsupportedTarget(format!(
                        "{entity}.{name} can not be replaced"
                    )))
                }
            }
        }
        session.track(entity, stub, EntityState::Modified)?;
        Ok(())
    }

    fn descend(&self, node: Node, step: &str) -> Result<Node, ApplyCause> {
        match node {
            Node::Entity { entity, mut record } => {
                let property = self.adapter.entity_property(&entity, step)?;
                let target = property
                    .ty
                    .element()
                    .unwrap_or(&property.ty)
                    .as_named()
                    .unwrap_or_default()
                    .to_string();
                match &property.relation {
                    None => Err(ApplyCause::UnsupportedTarget(format!(
                        "{entity}.{step} is not a navigation"
                    ))),
                    Some(Relation::Reference { .. }) => match record.get_mut(step).map(Value::take) {
                        Some(record @ Value::Object(_)) => Ok(Node::Entity {
                            entity: target,
                            record,
                        }),
                        _ => Err(ApplyCause::MissingTarget),
                    },
                    Some(relation) => {
                        let owner_id = self.key_of(&entity, &record)?;
                        let items = match record.get_mut(step).map(Value::take) {
                            Some(Value::Array(items)) => items,
                            _ => Vec::new(),
                        };
                        Ok(Node::Collection {
                            owner: entity,
                            owner_id,
                            property: step.to_string(),
                            relation: relation.clone(),
                            target,
                            items,
                        })
                    }
                }
            }
            Node::Collection { target, mut items, .. } => {
                let key = self.key_name(&target)?;
                match Position::resolve(&items, &key, step, false) {
                    Position::Index(index) => Ok(Node::Entity {
                        record: items.swap_remove(index),
                        entity: target,
                    }),
                    Position::Append | Position::OutOfBounds => Err(missing_element(&target, step)),
                }
            }
        }
    }

    /// Loads the root entity with every navigation `path` walks through.
    async fn load<T: StoreSession>(
        &self,
        session: &mut T,
        root: &str,
        id: i64,
        path: &[String],
    ) -> Result<Value, ApplyCause> {
        let include = self.include_path(root, path)?;
        let include: Vec<String> = include.into_iter().collect();
        session
            .load(root, id, &include)
            .await?
            .ok_or_else(|| ApplyCause::NotFound {
                entity: root.to_string(),
                id,
            })
    }

    fn include_path(&self, root: &str, path: &[String]) -> Result<Option<String>, ApplyCause> {
        let mut entity = root.to_string();
        let mut navigations: Vec<&str> = Vec::new();
        for step in path {
            if is_element_step(step) {
                continue;
            }
            let property = self.adapter.entity_property(&entity, step)?;
            if property.relation.is_none() {
                break;
            }
            navigations.push(step);
            match property.ty.element().unwrap_or(&property.ty).as_named() {
                Some(target) => entity = target.to_string(),
                None => break,
            }
        }
        Ok((!navigations.is_empty()).then(|| navigations.join(".")))
    }

    fn key_name(&self, entity: &str) -> Result<String, ApplyCause> {
        Ok(self.adapter.entity(entity)?.key.clone())
    }

    fn key_of(&self, entity: &str, record: &Value) -> Result<i64, ApplyCause> {
        let key = self.key_name(entity)?;
        record
            .get(&key)
            .and_then(Value::as_i64)
            .ok_or_else(|| ApplyCause::UnsupportedTarget(format!("{entity} without '{key}'")))
    }

    /// An id-only record.
    fn stub(&self, entity: &str, id: i64) -> Result<Map<String, Value>, ApplyCause> {
        let mut stub = Map::new();
        stub.insert(self.key_name(entity)?, Value::from(id));
        Ok(stub)
    }
}

fn element_id(step: &str) -> Result<i64, ApplyCause> {
    match Segment::parse(step) {
        Segment::Id(id) => Ok(id),
        Segment::End => Err(ApplyCause::MissingTarget),
        Segment::Key(key) => Err(not_an_element(key)),
    }
}

fn not_an_element(step: &str) -> ApplyCause {
    ApplyCause::UnsupportedTarget(format!("'{step}' is not an element id"))
}

fn only_collections() -> ApplyCause {
    ApplyCause::UnsupportedTarget("available only for collections".into())
}

fn missing_element(entity: &str, step: &str) -> ApplyCause {
    match Segment::parse(step) {
        Segment::Id(id) => ApplyCause::NotFound {
            entity: entity.to_string(),
            id,
        },
        _ => ApplyCause::MissingTarget,
    }
}

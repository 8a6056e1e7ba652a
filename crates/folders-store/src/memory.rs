//! In-process [`EntityStore`].

use crate::error::StoreError;
use crate::graph::{materialize, Includes};
use crate::tables::{as_key, entity_descriptor, Change, Row, Tables};
use crate::{EntityState, EntityStore, StoreSession};
use folders_mapping::{Catalog, LinkTable, Relation};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared in-memory tables, one per registered entity, plus one link table
/// per many-to-many relation. Cloning shares the tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    catalog: Arc<Catalog>,
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::builder(catalog).build()
    }

    pub fn builder(catalog: Arc<Catalog>) -> MemoryStoreBuilder {
        let tables = Tables::new(&catalog);
        MemoryStoreBuilder { catalog, tables }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Target keys linked to `owner #owner_id` through `property`, in link
    /// insertion order.
    pub async fn linked(
        &self,
        owner: &str,
        property: &str,
        owner_id: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let link = link_of(&self.catalog, owner, property)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .links
            .get(&link.name)
            .into_iter()
            .flatten()
            .filter(|row| row.get(&link.owner_key) == Some(&owner_id))
            .filter_map(|row| row.get(&link.target_key).copied())
            .collect())
    }

    /// Committed row of `entity #id`, without navigations.
    pub async fn row(&self, entity: &str, id: i64) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.table(entity)?.get(&id).cloned().map(Value::Object))
    }
}

impl EntityStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, StoreError> {
        let working = self.tables.lock().await.clone();
        tracing::trace!("session started");
        Ok(MemorySession {
            catalog: self.catalog.clone(),
            shared: self.tables.clone(),
            working,
            pending: Vec::new(),
            journal: Vec::new(),
            next_keys: HashMap::new(),
        })
    }

    async fn query(&self, entity: &str, include: &[String]) -> Result<Vec<Value>, StoreError> {
        let includes = Includes::parse(include);
        let tables = self.tables.lock().await;
        tables
            .table(entity)?
            .values()
            .map(|row| materialize(&tables, &self.catalog, entity, row, &includes))
            .collect()
    }
}

/// Seeds tables before the store is shared.
#[derive(Debug)]
pub struct MemoryStoreBuilder {
    catalog: Arc<Catalog>,
    tables: Tables,
}

impl MemoryStoreBuilder {
    /// Inserts `rows` into `entity`. Every row needs its key.
    pub fn rows(
        mut self,
        entity: &str,
        rows: impl IntoIterator<Item = Value>,
    ) -> Result<Self, StoreError> {
        for record in rows {
            let Value::Object(record) = record else {
                return Err(StoreError::MissingKey {
                    entity: entity.to_string(),
                });
            };
            let (id, row) = insert_row(&self.catalog, entity, record, None)?;
            let change = Change::Insert {
                entity: entity.to_string(),
                id,
                row,
            };
            self.tables.apply(&self.catalog, &change)?;
        }
        Ok(self)
    }

    /// Links `owner #owner_id` to `target_id` through the many-to-many
    /// `property`.
    pub fn link(
        mut self,
        owner: &str,
        property: &str,
        owner_id: i64,
        target_id: i64,
    ) -> Result<Self, StoreError> {
        let link = link_of(&self.catalog, owner, property)?;
        let change = Change::Link {
            link,
            owner: owner_id,
            target: target_id,
        };
        self.tables.apply(&self.catalog, &change)?;
        Ok(self)
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore {
            catalog: self.catalog,
            tables: Arc::new(Mutex::new(self.tables)),
        }
    }
}

/// A snapshot of the shared tables plus the changes made on top of it.
#[derive(Debug)]
pub struct MemorySession {
    catalog: Arc<Catalog>,
    shared: Arc<Mutex<Tables>>,
    working: Tables,
    /// Tracked, not yet flushed.
    pending: Vec<Change>,
    /// Flushed, replayed on commit.
    journal: Vec<Change>,
    next_keys: HashMap<String, i64>,
}

impl MemorySession {
    fn allocate_key(&mut self, entity: &str) -> i64 {
        let floor = self.working.max_key(entity);
        let pending = self
            .pending
            .iter()
            .filter_map(|change| match change {
                Change::Insert { entity: e, id, .. } if e == entity => Some(*id),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let next = self.next_keys.entry(entity.to_string()).or_insert(0);
        *next = (*next).max(floor).max(pending) + 1;
        *next
    }
}

impl StoreSession for MemorySession {
    async fn load(
        &mut self,
        entity: &str,
        id: i64,
        include: &[String],
    ) -> Result<Option<Value>, StoreError> {
        let includes = Includes::parse(include);
        match self.working.table(entity)?.get(&id) {
            Some(row) => materialize(&self.working, &self.catalog, entity, row, &includes).map(Some),
            None => Ok(None),
        }
    }

    fn track(
        &mut self,
        entity: &str,
        record: Map<String, Value>,
        state: EntityState,
    ) -> Result<i64, StoreError> {
        let descriptor = entity_descriptor(&self.catalog, entity)?;
        let key = descriptor.key.clone();
        let existing = as_key(record.get(&key));
        let missing_key = || StoreError::MissingKey {
            entity: entity.to_string(),
        };

        let id = match state {
            EntityState::Added => {
                let id = match existing {
                    Some(id) => id,
                    None => self.allocate_key(entity),
                };
                let (id, row) = insert_row(&self.catalog, entity, record, Some(id))?;
                self.pending.push(Change::Insert {
                    entity: entity.to_string(),
                    id,
                    row,
                });
                id
            }
            EntityState::Modified => {
                let id = existing.ok_or_else(missing_key)?;
                let columns = columns(&self.catalog, entity, record)?;
                self.pending.push(Change::Update {
                    entity: entity.to_string(),
                    id,
                    columns,
                });
                id
            }
            EntityState::Deleted => {
                let id = existing.ok_or_else(missing_key)?;
                self.pending.push(Change::Delete {
                    entity: entity.to_string(),
                    id,
                });
                id
            }
            EntityState::Unchanged => existing.ok_or_else(missing_key)?,
            EntityState::Detached => {
                let id = existing.ok_or_else(missing_key)?;
                self.pending.retain(|change| !touches(change, entity, id));
                id
            }
        };
        tracing::trace!(entity, id, ?state, "tracked");
        Ok(id)
    }

    fn append_to_collection(
        &mut self,
        owner: &str,
        owner_id: i64,
        property: &str,
        target_id: i64,
    ) -> Result<(), StoreError> {
        let change = match collection_relation(&self.catalog, owner, property)? {
            (Relation::ManyToMany { link }, _) => Change::Link {
                link,
                owner: owner_id,
                target: target_id,
            },
            (Relation::OneToMany { inverse_key }, child) => Change::Update {
                entity: child,
                id: target_id,
                columns: Map::from_iter([(inverse_key, Value::from(owner_id))]),
            },
            (Relation::Reference { .. }, _) => return Err(not_collection(owner, property)),
        };
        self.pending.push(change);
        Ok(())
    }

    fn remove_from_collection(
        &mut self,
        owner: &str,
        owner_id: i64,
        property: &str,
        target_id: i64,
    ) -> Result<(), StoreError> {
        let change = match collection_relation(&self.catalog, owner, property)? {
            (Relation::ManyToMany { link }, _) => Change::Unlink {
                link,
                owner: owner_id,
                target: target_id,
            },
            (Relation::OneToMany { inverse_key }, child) => {
                let owned = self
                    .working
                    .table(&child)?
                    .get(&target_id)
                    .is_some_and(|row| as_key(row.get(&inverse_key)) == Some(owner_id));
                if !owned {
                    return Err(StoreError::Conflict {
                        entity: child,
                        id: target_id,
                    });
                }
                Change::Delete {
                    entity: child,
                    id: target_id,
                }
            }
            (Relation::Reference { .. }, _) => return Err(not_collection(owner, property)),
        };
        self.pending.push(change);
        Ok(())
    }

    async fn save_changes(&mut self) -> Result<u64, StoreError> {
        let pending = std::mem::take(&mut self.pending);
        let mut next = self.working.clone();
        let mut affected = 0;
        for change in &pending {
            affected += next.apply(&self.catalog, change)?;
        }
        self.working = next;
        self.journal.extend(pending);
        tracing::trace!(affected, "changes saved");
        Ok(affected)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut shared = self.shared.lock().await;
        let mut next = shared.clone();
        for change in &self.journal {
            next.apply(&self.catalog, change)?;
        }
        *shared = next;
        tracing::trace!(changes = self.journal.len(), "session committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        tracing::trace!(
            discarded = self.journal.len() + self.pending.len(),
            "session rolled back"
        );
        Ok(())
    }
}

/// Stored columns of `record`: navigation values are dropped, unknown names
/// are rejected.
fn columns(catalog: &Catalog, entity: &str, record: Row) -> Result<Row, StoreError> {
    let descriptor = entity_descriptor(catalog, entity)?;
    let mut columns = Map::new();
    for (name, value) in record {
        match descriptor.get(&name) {
            Some(property) if property.is_navigation() => {}
            Some(_) => {
                columns.insert(name, value);
            }
            None => {
                return Err(StoreError::UnknownColumn {
                    entity: entity.to_string(),
                    column: name,
                })
            }
        }
    }
    Ok(columns)
}

/// A full row for insertion: every column present, key set.
fn insert_row(
    catalog: &Catalog,
    entity: &str,
    record: Row,
    id: Option<i64>,
) -> Result<(i64, Row), StoreError> {
    let descriptor = entity_descriptor(catalog, entity)?;
    let mut provided = columns(catalog, entity, record)?;
    let id = id
        .or_else(|| as_key(provided.get(&descriptor.key)))
        .ok_or_else(|| StoreError::MissingKey {
            entity: entity.to_string(),
        })?;
    provided.insert(descriptor.key.clone(), Value::from(id));
    let mut row = Map::new();
    for property in descriptor.properties.values().filter(|p| !p.is_navigation()) {
        let value = provided.remove(&property.name).unwrap_or(Value::Null);
        row.insert(property.name.clone(), value);
    }
    Ok((id, row))
}

/// Relation and target entity of a collection navigation.
fn collection_relation(
    catalog: &Catalog,
    owner: &str,
    property: &str,
) -> Result<(Relation, String), StoreError> {
    let missing = || not_collection(owner, property);
    let declared = entity_descriptor(catalog, owner)?
        .get(property)
        .ok_or_else(missing)?;
    let target = declared
        .ty
        .element()
        .and_then(|t| t.as_named())
        .ok_or_else(missing)?;
    let relation = declared.relation.clone().ok_or_else(missing)?;
    Ok((relation, target.to_string()))
}

fn not_collection(owner: &str, property: &str) -> StoreError {
    StoreError::NotCollection {
        entity: owner.to_string(),
        property: property.to_string(),
    }
}

fn link_of(catalog: &Catalog, owner: &str, property: &str) -> Result<LinkTable, StoreError> {
    match collection_relation(catalog, owner, property)? {
        (Relation::ManyToMany { link }, _) => Ok(link),
        _ => Err(not_collection(owner, property)),
    }
}

fn touches(change: &Change, entity: &str, id: i64) -> bool {
    match change {
        Change::Insert { entity: e, id: i, .. }
        | Change::Update { entity: e, id: i, .. }
        | Change::Delete { entity: e, id: i } => e == entity && *i == id,
        Change::Link { .. } | Change::Unlink { .. } => false,
    }
}

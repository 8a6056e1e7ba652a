//! Row storage and change application.

use crate::error::StoreError;
use folders_mapping::{Catalog, LinkTable, Relation, TypeDescriptor};
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub(crate) type Row = Map<String, Value>;

/// A link-table row: column name → key.
pub(crate) type LinkRow = BTreeMap<String, i64>;

/// A flushed change, replayed on commit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Change {
    Insert { entity: String, id: i64, row: Row },
    Update { entity: String, id: i64, columns: Row },
    Delete { entity: String, id: i64 },
    Link { link: LinkTable, owner: i64, target: i64 },
    Unlink { link: LinkTable, owner: i64, target: i64 },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub rows: IndexMap<String, IndexMap<i64, Row>>,
    pub links: IndexMap<String, IndexSet<LinkRow>>,
}

pub(crate) fn link_row(link: &LinkTable, owner: i64, target: i64) -> LinkRow {
    BTreeMap::from([
        (link.owner_key.clone(), owner),
        (link.target_key.clone(), target),
    ])
}

pub(crate) fn as_key(value: Option<&Value>) -> Option<i64> {
    value.and_then(Value::as_i64)
}

impl Tables {
    pub fn new(catalog: &Catalog) -> Self {
        let mut tables = Tables::default();
        for descriptor in catalog.types().filter(|d| !d.is_dto()) {
            tables.rows.insert(descriptor.name.clone(), IndexMap::new());
            for property in descriptor.properties.values() {
                if let Some(Relation::ManyToMany { link }) = &property.relation {
                    tables.links.entry(link.name.clone()).or_default();
                }
            }
        }
        tables
    }

    pub fn table(&self, entity: &str) -> Result<&IndexMap<i64, Row>, StoreError> {
        self.rows
            .get(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }

    fn table_mut(&mut self, entity: &str) -> Result<&mut IndexMap<i64, Row>, StoreError> {
        self.rows
            .get_mut(entity)
            .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
    }

    pub fn contains(&self, entity: &str, id: i64) -> bool {
        self.rows.get(entity).is_some_and(|t| t.contains_key(&id))
    }

    pub fn max_key(&self, entity: &str) -> i64 {
        self.rows
            .get(entity)
            .and_then(|t| t.keys().max().copied())
            .unwrap_or(0)
    }

    /// Applies one change and returns the number of affected rows.
    pub fn apply(&mut self, catalog: &Catalog, change: &Change) -> Result<u64, StoreError> {
        match change {
            Change::Insert { entity, id, row } => {
                let descriptor = entity_descriptor(catalog, entity)?;
                if self.contains(entity, *id) {
                    return Err(StoreError::ConstraintViolation(format!(
                        "duplicate key {entity} #{id}"
                    )));
                }
                self.check_foreign_keys(catalog, descriptor, row)?;
                self.table_mut(entity)?.insert(*id, row.clone());
                Ok(1)
            }
            Change::Update {
                entity,
                id,
                columns,
            } => {
                let descriptor = entity_descriptor(catalog, entity)?;
                let mut row = self
                    .table(entity)?
                    .get(id)
                    .cloned()
                    .ok_or_else(|| conflict(entity, *id))?;
                for (column, value) in columns {
                    if column == &descriptor.key && as_key(Some(value)) != Some(*id) {
                        return Err(StoreError::ConstraintViolation(format!(
                            "key of {entity} #{id} can not change"
                        )));
                    }
                    row.insert(column.clone(), value.clone());
                }
                self.check_foreign_keys(catalog, descriptor, &row)?;
                self.table_mut(entity)?.insert(*id, row);
                Ok(1)
            }
            Change::Delete { entity, id } => self.delete(catalog, entity, *id),
            Change::Link {
                link,
                owner,
                target,
            } => {
                let (owner_entity, target_entity) = link_endpoints(catalog, link)?;
                for (name, key) in [(owner_entity, *owner), (target_entity, *target)] {
                    if !self.contains(name, key) {
                        return Err(StoreError::ConstraintViolation(format!(
                            "{} references missing {name} #{key}",
                            link.name
                        )));
                    }
                }
                let rows = self.links.entry(link.name.clone()).or_default();
                if !rows.insert(link_row(link, *owner, *target)) {
                    return Err(StoreError::ConstraintViolation(format!(
                        "duplicate key in {} ({owner}, {target})",
                        link.name
                    )));
                }
                Ok(1)
            }
            Change::Unlink {
                link,
                owner,
                target,
            } => {
                let removed = self
                    .links
                    .get_mut(&link.name)
                    .is_some_and(|rows| rows.shift_remove(&link_row(link, *owner, *target)));
                if !removed {
                    return Err(StoreError::Conflict {
                        entity: link.name.clone(),
                        id: *target,
                    });
                }
                Ok(1)
            }
        }
    }

    /// Deletes a row, its link rows and its one-to-many children. Rows
    /// still referenced through a foreign key block the delete.
    fn delete(&mut self, catalog: &Catalog, entity: &str, id: i64) -> Result<u64, StoreError> {
        let descriptor = entity_descriptor(catalog, entity)?;
        if !self.contains(entity, id) {
            return Err(conflict(entity, id));
        }
        let mut affected = 0;

        for property in descriptor.properties.values() {
            if let Some(Relation::OneToMany { inverse_key }) = &property.relation {
                let Some(child) = property.ty.element().and_then(|t| t.as_named()) else {
                    continue;
                };
                let children: Vec<i64> = self
                    .table(child)?
                    .iter()
                    .filter(|(_, row)| as_key(row.get(inverse_key)) == Some(id))
                    .map(|(key, _)| *key)
                    .collect();
                for key in children {
                    affected += self.delete(catalog, child, key)?;
                }
            }
        }

        for owner in catalog.types().filter(|d| !d.is_dto()) {
            for property in owner.properties.values() {
                match &property.relation {
                    Some(Relation::ManyToMany { link }) => {
                        let column = if owner.name == entity {
                            &link.owner_key
                        } else if property.ty.element().and_then(|t| t.as_named()) == Some(entity) {
                            &link.target_key
                        } else {
                            continue;
                        };
                        if let Some(rows) = self.links.get_mut(&link.name) {
                            let before = rows.len();
                            rows.retain(|row| row.get(column) != Some(&id));
                            affected += (before - rows.len()) as u64;
                        }
                    }
                    Some(Relation::Reference { foreign_key })
                        if property.ty.as_named() == Some(entity) =>
                    {
                        let referenced = self
                            .table(&owner.name)?
                            .values()
                            .any(|row| as_key(row.get(foreign_key)) == Some(id));
                        if referenced {
                            return Err(StoreError::ConstraintViolation(format!(
                                "{entity} #{id} is referenced by {}.{foreign_key}",
                                owner.name
                            )));
                        }
                    }
                    _ => {}
                }
            }
        }

        self.table_mut(entity)?.shift_remove(&id);
        Ok(affected + 1)
    }

    /// Non-null foreign keys and inverse keys of `row` must point at
    /// existing rows.
    fn check_foreign_keys(
        &self,
        catalog: &Catalog,
        descriptor: &TypeDescriptor,
        row: &Row,
    ) -> Result<(), StoreError> {
        let mut checks = Vec::new();
        for property in descriptor.properties.values() {
            if let Some(Relation::Reference { foreign_key }) = &property.relation {
                if let Some(target) = property.ty.as_named() {
                    checks.push((foreign_key.as_str(), target));
                }
            }
        }
        for parent in catalog.types().filter(|d| !d.is_dto()) {
            for property in parent.properties.values() {
                if let Some(Relation::OneToMany { inverse_key }) = &property.relation {
                    if property.ty.element().and_then(|t| t.as_named()) == Some(descriptor.name.as_str()) {
                        checks.push((inverse_key.as_str(), parent.name.as_str()));
                    }
                }
            }
        }
        for (column, target) in checks {
            match row.get(column) {
                None | Some(Value::Null) => {}
                Some(value) => match value.as_i64() {
                    Some(key) if self.contains(target, key) => {}
                    _ => {
                        return Err(StoreError::ConstraintViolation(format!(
                            "{}.{column} = {value} does not reference an existing {target}",
                            descriptor.name
                        )))
                    }
                },
            }
        }
        Ok(())
    }
}

pub(crate) fn entity_descriptor<'c>(
    catalog: &'c Catalog,
    entity: &str,
) -> Result<&'c TypeDescriptor, StoreError> {
    catalog
        .get(entity)
        .filter(|d| !d.is_dto())
        .ok_or_else(|| StoreError::UnknownEntity(entity.to_string()))
}

/// Owner and target entity of a link table.
fn link_endpoints<'c>(catalog: &'c Catalog, link: &LinkTable) -> Result<(&'c str, &'c str), StoreError> {
    for owner in catalog.types().filter(|d| !d.is_dto()) {
        for property in owner.properties.values() {
            if let Some(Relation::ManyToMany { link: declared }) = &property.relation {
                if declared == link {
                    if let Some(target) = property.ty.element().and_then(|t| t.as_named()) {
                        return Ok((owner.name.as_str(), target));
                    }
                }
            }
        }
    }
    Err(StoreError::UnknownEntity(link.name.clone()))
}

fn conflict(entity: &str, id: i64) -> StoreError {
    StoreError::Conflict {
        entity: entity.to_string(),
        id,
    }
}

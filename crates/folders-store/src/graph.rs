//! Eager loading of navigation properties.

use crate::error::StoreError;
use crate::tables::{as_key, entity_descriptor, Row, Tables};
use folders_mapping::{Catalog, Relation};
use indexmap::IndexMap;
use serde_json::Value;

/// Dotted include paths folded into a tree: `["a", "a.b", "c"]` becomes
/// `{a: {b: {}}, c: {}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Includes(IndexMap<String, Includes>);

impl Includes {
    pub fn parse(paths: &[String]) -> Self {
        let mut root = Includes::default();
        for path in paths {
            let mut node = &mut root;
            for step in path.split('.').filter(|s| !s.is_empty()) {
                node = node.0.entry(step.to_string()).or_default();
            }
        }
        root
    }
}

/// Copies `row` and attaches every included navigation.
pub(crate) fn materialize(
    tables: &Tables,
    catalog: &Catalog,
    entity: &str,
    row: &Row,
    includes: &Includes,
) -> Result<Value, StoreError> {
    let descriptor = entity_descriptor(catalog, entity)?;
    let mut record = row.clone();
    let id = as_key(row.get(&descriptor.key));

    for (name, nested) in &includes.0 {
        let property = descriptor
            .get(name)
            .ok_or_else(|| StoreError::UnknownColumn {
                entity: entity.to_string(),
                column: name.clone(),
            })?;
        let Some(relation) = &property.relation else {
            continue;
        };
        let target = property
            .ty
            .element()
            .unwrap_or(&property.ty)
            .as_named()
            .ok_or_else(|| StoreError::UnknownEntity(property.ty.to_string()))?;
        let value = match relation {
            Relation::Reference { foreign_key } => {
                match as_key(row.get(foreign_key)).and_then(|k| tables.table(target).ok()?.get(&k)) {
                    Some(target_row) => materialize(tables, catalog, target, target_row, nested)?,
                    None => Value::Null,
                }
            }
            Relation::OneToMany { inverse_key } => {
                let mut children = Vec::new();
                for child in tables
                    .table(target)?
                    .values()
                    .filter(|child| id.is_some() && as_key(child.get(inverse_key)) == id)
                {
                    children.push(materialize(tables, catalog, target, child, nested)?);
                }
                Value::Array(children)
            }
            Relation::ManyToMany { link } => {
                let rows = tables.table(target)?;
                let mut linked = Vec::new();
                for link_row in tables.links.get(&link.name).into_iter().flatten() {
                    if id.is_none() || link_row.get(&link.owner_key).copied() != id {
                        continue;
                    }
                    let target_row = link_row
                        .get(&link.target_key)
                        .and_then(|key| rows.get(key));
                    if let Some(target_row) = target_row {
                        linked.push(materialize(tables, catalog, target, target_row, nested)?);
                    }
                }
                Value::Array(linked)
            }
        };
        record.insert(name.clone(), value);
    }
    Ok(Value::Object(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_fold_into_a_tree() {
        let includes = Includes::parse(&["a".into(), "a.b".into(), "c".into(), "a.d".into()]);
        let a = includes.0.get("a").unwrap();
        assert_eq!(a.0.keys().collect::<Vec<_>>(), ["b", "d"]);
        assert!(includes.0.get("c").unwrap().0.is_empty());
    }
}

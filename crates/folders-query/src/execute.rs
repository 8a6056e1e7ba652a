//! Runs validated list queries against an entity store.

use crate::error::QueryError;
use crate::member::origin;
use crate::predicate::Predicate;
use crate::types::{ListQuery, QueryOptions};
use folders_mapping::{MappingAdapter, MappingError, Projector};
use folders_store::EntityStore;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use tokio_util::sync::CancellationToken;

/// One page of projected DTOs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub items: Vec<Value>,
    /// Rows matching the filters, before paging.
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ListExecutor {
    adapter: MappingAdapter,
    projector: Projector,
    options: QueryOptions,
}

impl ListExecutor {
    pub fn new(adapter: MappingAdapter, options: QueryOptions) -> Self {
        Self {
            projector: Projector::new(adapter.clone()),
            adapter,
            options,
        }
    }

    /// Applies the compiled filters in order, then the orders as successive
    /// tie-breakers (stable), then `skip`/`take`, and projects the page into
    /// `dto_type`.
    ///
    /// # Errors
    ///
    /// `Cancelled` when `cancel` fires before the store is queried.
    pub async fn execute<S: EntityStore>(
        &self,
        query: &ListQuery,
        dto_type: &str,
        store: &S,
        cancel: &CancellationToken,
    ) -> Result<ListPage, QueryError> {
        let entity = origin(&self.adapter, dto_type)?;
        let includes = self.includes(dto_type, &entity, query)?;

        if cancel.is_cancelled() {
            tracing::debug!(dto_type, "list query cancelled");
            return Err(QueryError::Cancelled);
        }
        let rows = store.query(&entity, &includes).await?;

        let mut rows: Vec<Value> = rows
            .into_iter()
            .filter(|row| query.filters.iter().all(|filter| filter.matches(row)))
            .collect();
        rows.sort_by(|a, b| {
            query
                .orders
                .iter()
                .map(|order| order.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let total = rows.len();
        let take = query.take.unwrap_or(self.options.default_take);
        let items = rows
            .iter()
            .skip(query.skip.unwrap_or(0))
            .take(take)
            .map(|row| self.projector.project(dto_type, row))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(dto_type, total, returned = items.len(), "list query executed");
        Ok(ListPage { items, total })
    }

    /// Navigations to load: everything the projection reads plus everything
    /// the filters and orders walk through.
    fn includes(&self, dto_type: &str, entity: &str, query: &ListQuery) -> Result<Vec<String>, MappingError> {
        let mut includes = self.projector.include_paths(dto_type)?;
        for filter in &query.filters {
            self.predicate_includes(entity, "", &filter.predicate, &mut includes)?;
        }
        for order in &query.orders {
            self.navigations(entity, "", &order.end_point, &mut includes)?;
        }
        Ok(includes)
    }

    fn predicate_includes(
        &self,
        entity: &str,
        prefix: &str,
        predicate: &Predicate,
        includes: &mut Vec<String>,
    ) -> Result<(), MappingError> {
        match predicate {
            Predicate::Eq { member, .. } | Predicate::Range { member, .. } => {
                self.navigations(entity, prefix, member, includes)?;
            }
            Predicate::Or(items) => {
                for item in items {
                    self.predicate_includes(entity, prefix, item, includes)?;
                }
            }
            Predicate::Not(inner) => self.predicate_includes(entity, prefix, inner, includes)?,
            Predicate::Any { collection, inner } => {
                let (target, path) = self.navigations(entity, prefix, collection, includes)?;
                self.predicate_includes(&target, &path, inner, includes)?;
            }
        }
        Ok(())
    }

    /// Adds the navigation prefixes of `member` and returns the entity and
    /// include path reached.
    fn navigations(
        &self,
        entity: &str,
        prefix: &str,
        member: &[String],
        includes: &mut Vec<String>,
    ) -> Result<(String, String), MappingError> {
        let mut entity = entity.to_string();
        let mut path = prefix.to_string();
        for step in member {
            let property = self.adapter.entity_property(&entity, step)?;
            if !property.is_navigation() {
                break;
            }
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(step);
            if !includes.contains(&path) {
                includes.push(path.clone());
            }
            match property.ty.element().unwrap_or(&property.ty).as_named() {
                Some(target) => entity = target.to_string(),
                None => break,
            }
        }
        Ok((entity, path))
    }
}

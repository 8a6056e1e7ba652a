//! The relational entity store the patch applier and list executor run
//! against.
//!
//! - [`EntityStore`] / [`StoreSession`]: the capability: begin a session,
//!   load graphs by id with eager includes, mark entity states, edit
//!   navigation collections, flush, commit or roll back.
//! - [`MemoryStore`]: an in-process implementation keyed by the type
//!   catalog. Sessions work on a snapshot; commit replays the flushed
//!   journal onto the shared tables in one step.
//!
//! Records are JSON objects. Scalar columns (foreign keys included) are
//! stored; navigation properties only appear on loaded graphs.

mod error;
mod graph;
mod memory;
mod tables;

#[cfg(feature = "fixtures")]
pub mod fixtures;

pub use error::StoreError;
pub use memory::{MemorySession, MemoryStore};

use serde_json::{Map, Value};

/// Change-tracking state of an entity inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Not tracked; pending changes for the entity are dropped.
    Detached,
    /// Exists as-is; only used as an anchor for collection edits.
    Unchanged,
    /// Inserted on the next flush.
    Added,
    /// The record's columns are written on the next flush.
    Modified,
    /// Deleted on the next flush.
    Deleted,
}

/// Begins sessions and answers whole-set queries.
#[allow(async_fn_in_trait)]
pub trait EntityStore: Send + Sync {
    type Session: StoreSession;

    /// Begins a session over a consistent snapshot.
    async fn begin(&self) -> Result<Self::Session, StoreError>;

    /// Every committed row of `entity`, in insertion order, with the dotted
    /// navigation paths in `include` eagerly loaded.
    async fn query(&self, entity: &str, include: &[String]) -> Result<Vec<Value>, StoreError>;
}

/// One unit of work. Dropping a session without [`commit`](Self::commit)
/// discards it.
#[allow(async_fn_in_trait)]
pub trait StoreSession: Send + Sized {
    /// Loads `entity #id` as seen by this session, with `include` loaded.
    async fn load(
        &mut self,
        entity: &str,
        id: i64,
        include: &[String],
    ) -> Result<Option<Value>, StoreError>;

    /// Marks `record` with `state` and returns its key. `Added` records
    /// without a key get one allocated.
    fn track(
        &mut self,
        entity: &str,
        record: Map<String, Value>,
        state: EntityState,
    ) -> Result<i64, StoreError>;

    /// Adds `target_id` to the `property` collection of `owner #owner_id`.
    /// Many-to-many collections gain a link row; one-to-many collections
    /// re-parent the child.
    fn append_to_collection(
        &mut self,
        owner: &str,
        owner_id: i64,
        property: &str,
        target_id: i64,
    ) -> Result<(), StoreError>;

    /// Removes `target_id` from the `property` collection of `owner
    /// #owner_id`. Many-to-many collections lose the link row only;
    /// one-to-many children are deleted.
    fn remove_from_collection(
        &mut self,
        owner: &str,
        owner_id: i64,
        property: &str,
        target_id: i64,
    ) -> Result<(), StoreError>;

    /// Flushes pending changes into the session and returns the number of
    /// affected rows.
    async fn save_changes(&mut self) -> Result<u64, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

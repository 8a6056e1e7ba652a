//! Folders of subscribed channels.
//!
//! Users group the channels they follow into folders and keep notes on
//! them. Clients read [`catalog::FOLDER_DTO`]s through filtered, ordered
//! list queries and edit folders with patch documents addressed at
//! [`catalog::FOLDER_EDIT_DTO`]:
//!
//! ```json
//! [
//!   {"op": "replace", "path": "/1/name", "value": "News"},
//!   {"op": "add", "path": "/1/channels/-", "value": 4},
//!   {"op": "remove", "path": "/1/notes/2"}
//! ]
//! ```
//!
//! [`FolderService`] authorizes the request, runs it through the shared
//! [`Engine`] and the store.

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod telemetry;

pub use auth::{AuthError, Permission, Principal, Role};
pub use config::{ConfigError, EngineConfig, LogConfig};
pub use engine::Engine;
pub use error::ServiceError;
pub use service::FolderService;

//! Roles, permissions and the principal a request runs as.
//!
//! Folders belong to their owner. Reading and editing require the matching
//! permission and are scoped to the principal's own folders unless the
//! principal may manage users.

use crate::catalog::{FOLDER, USER};
use folders_store::{EntityStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    ReadFolders,
    EditFolders,
    ManageChannels,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::ReadFolders,
        Permission::EditFolders,
        Permission::ManageChannels,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadFolders => "ReadFolders",
            Permission::EditFolders => "EditFolders",
            Permission::ManageChannels => "ManageChannels",
            Permission::ManageUsers => "ManageUsers",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("user #{user} lacks permission {permission}")]
    Forbidden { user: i64, permission: Permission },

    #[error("folder #{folder} does not belong to user #{user}")]
    NotOwner { user: i64, folder: i64 },

    #[error("user #{0} does not exist")]
    UnknownUser(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The user a request runs as, with the roles granted to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: i64, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    /// Loads `user_id` with its roles and their permissions. Permission
    /// names the service does not know are ignored.
    pub async fn load<S: EntityStore>(store: &S, user_id: i64) -> Result<Self, AuthError> {
        let users = store.query(USER, &["roles.permissions".to_string()]).await?;
        let user = users
            .iter()
            .find(|user| user.get("id").and_then(Value::as_i64) == Some(user_id))
            .ok_or(AuthError::UnknownUser(user_id))?;
        let roles = user
            .get("roles")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|role| {
                let name = role.get("name").and_then(Value::as_str).unwrap_or_default();
                let permissions = role
                    .get("permissions")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|p| p.get("name").and_then(Value::as_str).and_then(Permission::parse));
                Role::new(name, permissions)
            })
            .collect();
        Ok(Self::new(user_id, roles))
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.roles.iter().any(|role| role.permissions.contains(&permission))
    }

    pub fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.has(permission) {
            Ok(())
        } else {
            tracing::info!(user = self.user_id, %permission, "permission denied");
            Err(AuthError::Forbidden {
                user: self.user_id,
                permission,
            })
        }
    }

    /// Whether the principal sees and edits every user's folders.
    pub fn sees_all(&self) -> bool {
        self.has(Permission::ManageUsers)
    }

    /// Fails unless every existing folder in `ids` belongs to the
    /// principal. Ids that do not exist yet are left to the store.
    ///
    /// Reads committed rows, not the snapshot the patch later applies to.
    /// A folder handed to another owner in between is not caught here.
    /// Nested elements are checked by the applier against the addressed
    /// folder.
    pub async fn check_owner<S: EntityStore>(&self, store: &S, ids: &BTreeSet<i64>) -> Result<(), AuthError> {
        if self.sees_all() || ids.is_empty() {
            return Ok(());
        }
        let folders = store.query(FOLDER, &[]).await?;
        for folder in folders {
            let Some(id) = folder.get("id").and_then(Value::as_i64) else {
                continue;
            };
            let owner = folder.get("ownerId").and_then(Value::as_i64);
            if ids.contains(&id) && owner != Some(self.user_id) {
                tracing::info!(user = self.user_id, folder = id, "foreign folder addressed");
                return Err(AuthError::NotOwner {
                    user: self.user_id,
                    folder: id,
                });
            }
        }
        Ok(())
    }
}

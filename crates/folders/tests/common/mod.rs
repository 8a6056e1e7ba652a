#![allow(dead_code)]

use folders::auth::Permission;
use folders::catalog::{CHANNEL, FOLDER, FOLDER_NOTE, PERMISSION, ROLE, USER};
use folders::{EngineConfig, Engine, FolderService, Principal};
use folders_query::ListPage;
use folders_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ADMIN: i64 = 3;

const MEMBER_ROLE: i64 = 1;
const ADMIN_ROLE: i64 = 2;

pub fn engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(|| Engine::build(EngineConfig::default()).expect("engine"))
}

/// Alice and Bob are members, Admin holds every permission. Alice owns
/// folders 1 and 2, Bob owns folder 3.
pub fn store() -> MemoryStore {
    let permissions = Permission::ALL
        .iter()
        .zip(1..)
        .map(|(permission, id)| json!({"id": id, "name": permission.as_str()}));
    let users = [
        json!({"id": ALICE, "login": "alice", "displayName": "Alice"}),
        json!({"id": BOB, "login": "bob", "displayName": "Bob"}),
        json!({"id": ADMIN, "login": "admin", "displayName": "Admin"}),
    ];
    let channels = (1..=6).map(|id| {
        json!({"id": id, "title": format!("channel-{id}"), "url": format!("https://channels.test/{id}")})
    });
    let folders = [
        json!({"id": 1, "name": "News", "color": "#ff0000", "position": 1, "ownerId": ALICE}),
        json!({"id": 2, "name": "Music", "color": "#00ff00", "position": 2, "ownerId": ALICE}),
        json!({"id": 3, "name": "Sport", "color": "#0000ff", "position": 1, "ownerId": BOB}),
    ];

    let mut builder = MemoryStore::builder(engine().catalog.clone())
        .rows(PERMISSION, permissions)
        .and_then(|b| b.rows(ROLE, [json!({"id": MEMBER_ROLE, "name": "member"}), json!({"id": ADMIN_ROLE, "name": "admin"})]))
        .and_then(|b| b.rows(USER, users))
        .and_then(|b| b.rows(CHANNEL, channels))
        .and_then(|b| b.rows(FOLDER, folders))
        .and_then(|b| b.rows(FOLDER_NOTE, [json!({"id": 1, "body": "morning reads", "folderId": 1})]))
        .expect("seed rows");

    // ReadFolders and EditFolders
    let links = [
        (ROLE, "permissions", MEMBER_ROLE, 1),
        (ROLE, "permissions", MEMBER_ROLE, 2),
        (ROLE, "permissions", ADMIN_ROLE, 1),
        (ROLE, "permissions", ADMIN_ROLE, 2),
        (ROLE, "permissions", ADMIN_ROLE, 3),
        (ROLE, "permissions", ADMIN_ROLE, 4),
        (USER, "roles", ALICE, MEMBER_ROLE),
        (USER, "roles", BOB, MEMBER_ROLE),
        (USER, "roles", ADMIN, ADMIN_ROLE),
        (FOLDER, "channels", 1, 1),
        (FOLDER, "channels", 1, 2),
        (FOLDER, "channels", 2, 3),
        (FOLDER, "channels", 3, 1),
        (FOLDER, "channels", 3, 4),
    ];
    for (owner, property, owner_id, target) in links {
        builder = builder.link(owner, property, owner_id, target).expect("seed link");
    }
    builder.build()
}

pub fn service() -> FolderService<'static, MemoryStore> {
    FolderService::new(engine(), store())
}

pub async fn principal(service: &FolderService<'static, MemoryStore>, user_id: i64) -> Principal {
    service.principal(user_id).await.expect("principal")
}

pub fn ids(page: &ListPage) -> Vec<i64> {
    page.items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_i64))
        .collect()
}

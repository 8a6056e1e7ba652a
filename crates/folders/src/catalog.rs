//! The folders schema: entities, the DTOs clients see, and how their
//! properties map onto each other.

use folders_mapping::{
    Catalog, CompareMethod, LinkTable, MappingError, Mappings, PropertyDescriptor, Rule,
    RuleValidator, ScalarType, TypeDescriptor, TypeRef,
};
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

pub const USER: &str = "User";
pub const ROLE: &str = "Role";
pub const PERMISSION: &str = "Permission";
pub const CHANNEL: &str = "Channel";
pub const FOLDER: &str = "Folder";
pub const FOLDER_NOTE: &str = "FolderNote";

pub const USER_DTO: &str = "UserDto";
pub const CHANNEL_DTO: &str = "ChannelDto";
pub const FOLDER_NOTE_DTO: &str = "FolderNoteDto";
pub const FOLDER_DTO: &str = "FolderDto";

pub const CHANNEL_REF_EDIT_DTO: &str = "ChannelRefEditDto";
pub const FOLDER_NOTE_EDIT_DTO: &str = "FolderNoteEditDto";
pub const FOLDER_EDIT_DTO: &str = "FolderEditDto";

fn id() -> PropertyDescriptor {
    PropertyDescriptor::scalar("id", ScalarType::Int64)
}

fn string(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::scalar(name, ScalarType::String)
}

fn entities() -> [TypeDescriptor; 6] {
    [
        TypeDescriptor::entity(PERMISSION).property(id()).property(string("name")),
        TypeDescriptor::entity(ROLE)
            .property(id())
            .property(string("name"))
            .property(PropertyDescriptor::many_to_many(
                "permissions",
                PERMISSION,
                LinkTable::new("role_permissions", "roleId", "permissionId"),
            )),
        TypeDescriptor::entity(USER)
            .property(id())
            .property(string("login"))
            .property(string("displayName"))
            .property(PropertyDescriptor::many_to_many(
                "roles",
                ROLE,
                LinkTable::new("user_roles", "userId", "roleId"),
            )),
        TypeDescriptor::entity(CHANNEL)
            .property(id())
            .property(string("title"))
            .property(string("url")),
        TypeDescriptor::entity(FOLDER_NOTE)
            .property(id())
            .property(string("body"))
            .property(PropertyDescriptor::scalar("folderId", ScalarType::Int64)),
        TypeDescriptor::entity(FOLDER)
            .property(id())
            .property(string("name"))
            .property(string("color"))
            .property(PropertyDescriptor::scalar("position", ScalarType::Int32))
            .property(PropertyDescriptor::scalar("ownerId", ScalarType::Int64))
            .property(PropertyDescriptor::reference("owner", USER, "ownerId"))
            .property(PropertyDescriptor::many_to_many(
                "channels",
                CHANNEL,
                LinkTable::new("folder_channels", "folderId", "channelId"),
            ))
            .property(PropertyDescriptor::one_to_many("notes", FOLDER_NOTE, "folderId")),
    ]
}

fn read_dtos() -> [TypeDescriptor; 4] {
    let equals = |property: PropertyDescriptor| property.filterable(CompareMethod::Equals);
    [
        TypeDescriptor::read_dto(USER_DTO, USER)
            .property(equals(id()))
            .property(equals(string("login")))
            .property(string("displayName")),
        TypeDescriptor::read_dto(CHANNEL_DTO, CHANNEL)
            .property(equals(id()))
            .property(equals(string("name")))
            .property(string("url")),
        TypeDescriptor::read_dto(FOLDER_NOTE_DTO, FOLDER_NOTE)
            .property(equals(id()))
            .property(equals(string("text"))),
        TypeDescriptor::read_dto(FOLDER_DTO, FOLDER)
            .property(equals(id()))
            .property(equals(string("name")))
            .property(equals(string("color")))
            .property(equals(PropertyDescriptor::scalar("position", ScalarType::Int32)))
            .property(
                PropertyDescriptor::new("owner", TypeRef::named(USER_DTO))
                    .filterable(CompareMethod::ById),
            )
            .property(equals(string("ownerLogin")))
            .property(
                PropertyDescriptor::new("channels", TypeRef::collection_of(TypeRef::named(CHANNEL_DTO)))
                    .filterable(CompareMethod::Nested),
            )
            .property(
                PropertyDescriptor::new(
                    "notes",
                    TypeRef::collection_of(TypeRef::named(FOLDER_NOTE_DTO)),
                )
                .filterable(CompareMethod::Nested),
            ),
    ]
}

fn edit_dtos() -> Result<[TypeDescriptor; 3], MappingError> {
    let color = Regex::new("^#[0-9a-fA-F]{6}$").map_err(|e| MappingError::InvalidCatalog(e.to_string()))?;
    Ok([
        TypeDescriptor::edit_dto(CHANNEL_REF_EDIT_DTO, CHANNEL)
            .property(id())
            .conversion(ScalarType::Int32, |id| Some(json!({ "id": id }))),
        TypeDescriptor::edit_dto(FOLDER_NOTE_EDIT_DTO, FOLDER_NOTE)
            .property(id())
            .property(string("text"))
            .validator(
                RuleValidator::new()
                    .rule("text", Rule::NotEmpty)
                    .rule("text", Rule::MaxLength(500)),
            ),
        TypeDescriptor::edit_dto(FOLDER_EDIT_DTO, FOLDER)
            .property(id())
            .property(string("name"))
            .property(string("color"))
            .property(PropertyDescriptor::scalar("position", ScalarType::Int32))
            .property(PropertyDescriptor::new(
                "channels",
                TypeRef::collection_of(TypeRef::named(CHANNEL_REF_EDIT_DTO)),
            ))
            .property(PropertyDescriptor::new(
                "notes",
                TypeRef::collection_of(TypeRef::named(FOLDER_NOTE_EDIT_DTO)),
            ))
            .validator(
                RuleValidator::new()
                    .rule("name", Rule::Required)
                    .rule("name", Rule::NotEmpty)
                    .rule("name", Rule::MaxLength(64))
                    .rule("color", Rule::Pattern(color))
                    .rule(
                        "position",
                        Rule::Range {
                            min: 0.0,
                            max: 1000.0,
                        },
                    ),
            ),
    ])
}

/// Registers every folders type.
pub fn catalog() -> Result<Catalog, MappingError> {
    entities()
        .into_iter()
        .chain(read_dtos())
        .chain(edit_dtos()?)
        .fold(Catalog::builder(), |builder, descriptor| builder.register(descriptor))
        .build()
}

/// Property correspondences that differ from the same-name convention.
pub fn mappings(catalog: Arc<Catalog>) -> Result<Mappings, MappingError> {
    Mappings::builder(catalog)
        .map_member(CHANNEL_DTO, "name", "title")
        .map_member(FOLDER_NOTE_DTO, "text", "body")
        .map_path(FOLDER_NOTE_EDIT_DTO, "text", "body")
        .map_path(FOLDER_DTO, "ownerLogin", "owner.login")
        .build()
}

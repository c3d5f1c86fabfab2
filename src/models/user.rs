//! User entity and its request payloads.

use crate::models::base::{ColumnDef, EntitySchema, TIMESTAMPS, UUID_PRIMARY_KEY, VERSIONED};
use crate::service::{FieldRule, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const NAME_MAX_LENGTH: usize = 255;

const USER_FIELDS: &[ColumnDef] = &[
    ColumnDef::new("name", "VARCHAR(255)").nullable(),
    ColumnDef::new("title", "VARCHAR(255)").nullable(),
];

pub const USERS: EntitySchema = EntitySchema {
    table: "users",
    groups: &[UUID_PRIMARY_KEY, USER_FIELDS, TIMESTAMPS, VERSIONED],
};

/// A row of `users`.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Pass back on PATCH/DELETE.
    pub version: i32,
}

/// POST body. `id` is generated when omitted.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserCreate {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub title: Option<String>,
}

/// PATCH body. Absent fields are left unchanged; `version` must be the last version read.
#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub version: i32,
    pub name: Option<String>,
    pub title: Option<String>,
}

impl Validate for UserCreate {
    const RULES: &'static [FieldRule] = &[
        FieldRule::uuid("id"),
        FieldRule::string("name").max_length(NAME_MAX_LENGTH),
        FieldRule::string("title").max_length(NAME_MAX_LENGTH),
    ];
}

impl Validate for UserUpdate {
    const RULES: &'static [FieldRule] = &[
        FieldRule::integer("version").required().range(Some(1), Some(i32::MAX as i64)),
        FieldRule::string("name").max_length(NAME_MAX_LENGTH),
        FieldRule::string("title").max_length(NAME_MAX_LENGTH),
    ];
}

//! Builds parameterized user queries. Identifiers come from the declared schema or the
//! sort allow-list only; every client-supplied value is bound as a parameter.

use crate::models::{EntitySchema, USERS};
use sqlx::{Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Comma-separated quoted column list for an entity.
pub fn select_column_list(entity: &EntitySchema) -> String {
    entity
        .columns()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columns a client may sort users by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Title,
    CreatedAt,
    UpdatedAt,
}

impl UserSortField {
    pub const NAMES: &'static [&'static str] = &["name", "title", "created_at", "updated_at"];

    pub fn column(self) -> &'static str {
        match self {
            UserSortField::Name => "name",
            UserSortField::Title => "title",
            UserSortField::CreatedAt => "created_at",
            UserSortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for UserSortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(UserSortField::Name),
            "title" => Ok(UserSortField::Title),
            "created_at" => Ok(UserSortField::CreatedAt),
            "updated_at" => Ok(UserSortField::UpdatedAt),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UserSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserSort {
    pub field: UserSortField,
    pub order: SortOrder,
}

impl UserSort {
    pub const OLDEST_FIRST: UserSort = UserSort {
        field: UserSortField::CreatedAt,
        order: SortOrder::Asc,
    };
    pub const NEWEST_FIRST: UserSort = UserSort {
        field: UserSortField::CreatedAt,
        order: SortOrder::Desc,
    };
}

/// Escape `%`, `_` and `\` so the term matches literally inside ILIKE.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn push_search_filter(qb: &mut QueryBuilder<'static, Postgres>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = like_pattern(term);
        qb.push(" WHERE (")
            .push(quoted("name"))
            .push(" ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ")
            .push(quoted("title"))
            .push(" ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// SELECT users, optionally filtered by a case-insensitive substring of name or title.
/// Ties on the sort column are broken by id so pages are stable.
pub fn select_users(search: Option<&str>, sort: UserSort, skip: i64, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        select_column_list(&USERS),
        quoted(USERS.table)
    ));
    push_search_filter(&mut qb, search);
    qb.push(format!(
        " ORDER BY {} {}, {} ASC",
        quoted(sort.field.column()),
        sort.order.keyword(),
        quoted("id")
    ));
    qb.push(" OFFSET ").push_bind(skip);
    qb.push(" LIMIT ").push_bind(limit);
    qb
}

/// COUNT(*) over the same filter as [`select_users`].
pub fn count_users(search: Option<&str>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", quoted(USERS.table)));
    push_search_filter(&mut qb, search);
    qb
}

fn returning_users() -> String {
    format!(" RETURNING {}", select_column_list(&USERS))
}

/// SELECT one user by primary key.
pub fn select_user_by_id(id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE {} = ",
        select_column_list(&USERS),
        quoted(USERS.table),
        quoted("id")
    ));
    qb.push_bind(id);
    qb
}

/// SELECT EXISTS for a primary key; distinguishes a stale version from a missing row.
pub fn user_exists(id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = ",
        quoted(USERS.table),
        quoted("id")
    ));
    qb.push_bind(id).push(")");
    qb
}

/// INSERT one user. Timestamps and version take their column defaults.
pub fn insert_user(id: Uuid, name: Option<String>, title: Option<String>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}, {}, {}) VALUES (",
        quoted(USERS.table),
        quoted("id"),
        quoted("name"),
        quoted("title")
    ));
    let mut values = qb.separated(", ");
    values.push_bind(id);
    values.push_bind(name);
    values.push_bind(title);
    qb.push(")").push(returning_users());
    qb
}

/// Versioned UPDATE: matches only when the stored version equals `expected_version`,
/// then bumps the version and moves `updated_at` strictly forward. `None` leaves a column unchanged.
pub fn update_user(
    id: Uuid,
    expected_version: i32,
    name: Option<String>,
    title: Option<String>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", quoted(USERS.table)));
    if let Some(name) = name {
        qb.push(quoted("name")).push(" = ").push_bind(name).push(", ");
    }
    if let Some(title) = title {
        qb.push(quoted("title")).push(" = ").push_bind(title).push(", ");
    }
    let version = quoted("version");
    let updated_at = quoted("updated_at");
    qb.push(format!(
        "{version} = {version} + 1, {updated_at} = GREATEST(clock_timestamp(), {updated_at} + interval '1 microsecond')"
    ));
    qb.push(format!(" WHERE {} = ", quoted("id"))).push_bind(id);
    qb.push(format!(" AND {version} = ")).push_bind(expected_version);
    qb.push(returning_users());
    qb
}

/// Versioned DELETE with the same predicate as [`update_user`].
pub fn delete_user(id: Uuid, expected_version: i32) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE {} = ", quoted(USERS.table), quoted("id")));
    qb.push_bind(id);
    qb.push(format!(" AND {} = ", quoted("version"))).push_bind(expected_version);
    qb
}

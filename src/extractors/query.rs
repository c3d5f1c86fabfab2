//! Query-string extractors. Values are checked against field rules before any handler runs.

use crate::error::{AppError, FieldError, ValidationErrors};
use crate::service::{FieldRule, RequestValidator};
use crate::sql::{SortOrder, UserSort, UserSortField};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, extract::Query, http::request::Parts};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Parse the raw query string and validate it, returning the typed values as `T`.
fn validated_query<T: DeserializeOwned>(parts: &Parts, rules: &[FieldRule]) -> Result<T, AppError> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).map_err(|rej| {
        ValidationErrors::single(FieldError::new(&["query"], "query_invalid", rej.body_text()))
    })?;
    let typed = RequestValidator::validate_query(&params, rules)?;
    serde_json::from_value(Value::Object(typed))
        .map_err(|e| ValidationErrors::single(FieldError::new(&["query"], "value_error", e.to_string())).into())
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// `skip >= 0` (default 0) and `1 <= limit <= 100` (default 20).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Pagination {
    pub const RULES: &'static [FieldRule] = &[
        FieldRule::integer("skip").range(Some(0), None),
        FieldRule::integer("limit").range(Some(1), Some(MAX_LIMIT)),
    ];
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        validated_query(parts, Self::RULES)
    }
}

#[derive(Deserialize)]
struct RawSearch {
    q: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
}

/// `q` substring filter, `sort_by` from the allow-list, `order` `asc|desc` (default `asc`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    /// `None` when absent or empty.
    pub q: Option<String>,
    pub sort_by: Option<UserSortField>,
    pub order: SortOrder,
}

impl SearchParams {
    pub const RULES: &'static [FieldRule] = &[
        FieldRule::string("q"),
        FieldRule::string("sort_by").one_of(UserSortField::NAMES),
        FieldRule::string("order").pattern("^(asc|desc)$"),
    ];

    /// Requested ordering; newest first when no sort field is given.
    pub fn sort(&self) -> UserSort {
        match self.sort_by {
            Some(field) => UserSort {
                field,
                order: self.order,
            },
            None => UserSort::NEWEST_FIRST,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SearchParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw: RawSearch = validated_query(parts, Self::RULES)?;
        let sort_by = match raw.sort_by.as_deref() {
            None => None,
            Some(name) => Some(name.parse::<UserSortField>().map_err(|_| {
                ValidationErrors::single(FieldError::new(&["query", "sort_by"], "literal_error", "invalid sort field"))
            })?),
        };
        let order = match raw.order.as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };
        Ok(SearchParams {
            q: raw.q.filter(|q| !q.is_empty()),
            sort_by,
            order,
        })
    }
}

/// Required `version` query parameter for versioned deletes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ExpectedVersion {
    pub version: i32,
}

impl ExpectedVersion {
    pub const RULES: &'static [FieldRule] =
        &[FieldRule::integer("version").required().range(Some(1), Some(i32::MAX as i64))];
}

#[async_trait]
impl<S> FromRequestParts<S> for ExpectedVersion
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        validated_query(parts, Self::RULES)
    }
}

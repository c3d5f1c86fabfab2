//! UserRepository: user reads and optimistic-locking writes inside a session.

use crate::db::DbSession;
use crate::error::{AppError, DbError};
use crate::models::{User, UserCreate, UserUpdate, USERS};
use crate::sql::{count_users, delete_user, insert_user, select_user_by_id, select_users, update_user, user_exists, UserSort};
use sqlx::PgConnection;
use uuid::Uuid;

pub struct UserRepository;

impl UserRepository {
    /// Users oldest first.
    pub async fn list(session: &mut DbSession, skip: i64, limit: i64) -> Result<Vec<User>, AppError> {
        Self::search(session, None, UserSort::OLDEST_FIRST, skip, limit).await
    }

    /// Users whose name or title contains `query` (case-insensitive), in `sort` order.
    pub async fn search(
        session: &mut DbSession,
        query: Option<&str>,
        sort: UserSort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<User>, AppError> {
        let mut qb = select_users(query, sort, skip, limit);
        tracing::debug!(sql = %qb.sql(), "query");
        let rows = qb.build_query_as::<User>().fetch_all(session.conn().await?).await?;
        Ok(rows)
    }

    pub async fn count(session: &mut DbSession, query: Option<&str>) -> Result<i64, AppError> {
        let mut qb = count_users(query);
        tracing::debug!(sql = %qb.sql(), "query");
        let total = qb.build_query_scalar::<i64>().fetch_one(session.conn().await?).await?;
        Ok(total)
    }

    pub async fn get(session: &mut DbSession, id: Uuid) -> Result<User, AppError> {
        let mut qb = select_user_by_id(id);
        qb.build_query_as::<User>()
            .fetch_optional(session.conn().await?)
            .await?
            .ok_or_else(|| AppError::NotFound("User".into()))
    }

    /// Insert a user at version 1. Not committed until the session is.
    pub async fn create(session: &mut DbSession, input: UserCreate) -> Result<User, AppError> {
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        let mut qb = insert_user(id, input.name, input.title);
        tracing::debug!(sql = %qb.sql(), "insert");
        let user = qb.build_query_as::<User>().fetch_one(session.conn().await?).await?;
        Ok(user)
    }

    /// Apply `changes` only if the stored version still equals `changes.version`.
    pub async fn update(session: &mut DbSession, id: Uuid, changes: UserUpdate) -> Result<User, AppError> {
        let expected_version = changes.version;
        let mut qb = update_user(id, expected_version, changes.name, changes.title);
        tracing::debug!(sql = %qb.sql(), "update");
        let conn = session.conn().await?;
        match qb.build_query_as::<User>().fetch_optional(&mut *conn).await? {
            Some(user) => Ok(user),
            None => Err(stale_or_missing(conn, id, expected_version).await),
        }
    }

    /// Delete only if the stored version still equals `expected_version`.
    pub async fn delete(session: &mut DbSession, id: Uuid, expected_version: i32) -> Result<(), AppError> {
        let mut qb = delete_user(id, expected_version);
        tracing::debug!(sql = %qb.sql(), "delete");
        let conn = session.conn().await?;
        let result = qb.build().execute(&mut *conn).await?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(stale_or_missing(conn, id, expected_version).await)
        }
    }
}

/// Classify a versioned write that matched no row.
async fn stale_or_missing(conn: &mut PgConnection, id: Uuid, expected_version: i32) -> AppError {
    let mut qb = user_exists(id);
    match qb.build_query_scalar::<bool>().fetch_one(conn).await {
        Ok(true) => {
            tracing::warn!(%id, expected_version, "stale version on users write");
            DbError::StaleData {
                table: USERS.table,
                id,
                expected_version,
            }
            .into()
        }
        Ok(false) => AppError::NotFound("User".into()),
        Err(e) => e.into(),
    }
}

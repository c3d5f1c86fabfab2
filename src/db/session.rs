//! Session factory and the unit-of-work handle it produces.
//!
//! A session owns at most one open transaction, begun on first use. Statements run
//! immediately inside it, so later reads in the same session see earlier writes.
//! Nothing is committed unless [`DbSession::commit`] is called; dropping a session
//! returns its connection to the pool and the open transaction is rolled back.

use crate::db::Engine;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};

#[derive(Clone, Debug)]
pub struct SessionFactory {
    pool: PgPool,
}

impl SessionFactory {
    pub fn new(engine: &Engine) -> Self {
        SessionFactory {
            pool: engine.pool().clone(),
        }
    }

    pub fn session(&self) -> DbSession {
        DbSession {
            pool: self.pool.clone(),
            tx: None,
        }
    }
}

pub struct DbSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl DbSession {
    /// Connection inside the session's transaction, beginning one if none is open.
    pub async fn conn(&mut self) -> Result<&mut PgConnection, sqlx::Error> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        let tx = self.tx.insert(tx);
        Ok(&mut **tx)
    }

    /// Commit pending work. The session stays usable; the next statement opens a new transaction.
    pub async fn commit(&mut self) -> Result<(), sqlx::Error> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    /// Discard uncommitted work and release the connection.
    pub async fn close(mut self) -> Result<(), sqlx::Error> {
        self.rollback().await
    }
}

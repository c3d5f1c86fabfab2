//! Database lifecycle: `Uninitialized -> Initialized -> Disposed`.
//!
//! `init` and `dispose` run once each, at startup and shutdown. Between them the
//! engine and session factory are only read, so the lock is held just long enough
//! to clone them out and never across an `.await`.

use crate::config::DatabaseSettings;
use crate::db::{get_engine, DbSession, Engine, SessionFactory};
use crate::error::LifecycleError;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Upper bound on waiting for checked-out connections during shutdown.
const DISPOSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Disposed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Disposed => "disposed",
        })
    }
}

struct Inner {
    state: LifecycleState,
    engine: Option<Engine>,
    factory: Option<SessionFactory>,
}

pub struct Database {
    settings: DatabaseSettings,
    inner: RwLock<Inner>,
}

impl Database {
    pub fn new(settings: DatabaseSettings) -> Self {
        Database {
            settings,
            inner: RwLock::new(Inner {
                state: LifecycleState::Uninitialized,
                engine: None,
                factory: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.read().state
    }

    /// Current engine, if initialized.
    pub fn engine(&self) -> Option<Engine> {
        self.read().engine.clone()
    }

    /// Resolve the engine and build the session factory. Only valid once, from `Uninitialized`.
    /// On failure the state is unchanged.
    pub fn init(&self) -> Result<(), LifecycleError> {
        let mut inner = self.write();
        if inner.state != LifecycleState::Uninitialized {
            return Err(LifecycleError::InvalidTransition {
                action: "initialize",
                from: inner.state,
            });
        }
        tracing::info!("initializing database");
        let engine = get_engine(self.settings.provider, &self.settings).map_err(|e| {
            tracing::error!(error = %e, "failed to initialize database");
            e
        })?;
        inner.factory = Some(SessionFactory::new(&engine));
        inner.engine = Some(engine);
        inner.state = LifecycleState::Initialized;
        tracing::info!(provider = %self.settings.provider, "database initialized");
        Ok(())
    }

    /// Close pooled connections and move to `Disposed`. A no-op in any other state.
    pub async fn dispose(&self) {
        let engine = {
            let mut inner = self.write();
            if inner.state != LifecycleState::Initialized {
                tracing::debug!(state = %inner.state, "database already disposed or not initialized");
                return;
            }
            inner.state = LifecycleState::Disposed;
            inner.factory = None;
            inner.engine.take()
        };
        if let Some(engine) = engine {
            tracing::info!("closing database");
            match tokio::time::timeout(DISPOSE_TIMEOUT, engine.dispose()).await {
                Ok(()) => tracing::info!("database connections closed"),
                Err(_) => tracing::error!(timeout = ?DISPOSE_TIMEOUT, "timed out closing database connections"),
            }
        }
    }

    /// Round-trip `SELECT 1`. False when not initialized or the probe fails.
    pub async fn health_check(&self) -> bool {
        let Some(engine) = self.engine() else {
            return false;
        };
        match sqlx::query("SELECT 1").execute(engine.pool()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "database health check failed");
                false
            }
        }
    }

    /// New session from the factory. Fails with `NotInitialized` outside `Initialized`.
    pub fn session(&self) -> Result<DbSession, LifecycleError> {
        let inner = self.read();
        match (&inner.state, &inner.factory) {
            (LifecycleState::Initialized, Some(factory)) => Ok(factory.session()),
            _ => Err(LifecycleError::NotInitialized),
        }
    }

    /// Run one unit of work in a fresh session.
    ///
    /// If `f` fails the session is rolled back before the error is returned. The
    /// session is closed on every path; if this future is dropped mid-flight the
    /// connection goes back to the pool and the open transaction is rolled back.
    pub async fn with_session<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut DbSession) -> BoxFuture<'s, Result<T, E>> + Send,
        T: Send,
        E: From<LifecycleError> + From<sqlx::Error> + Send,
    {
        let mut session = self.session()?;
        match f(&mut session).await {
            Ok(value) => {
                session.close().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                drop(session);
                Err(e)
            }
        }
    }
}

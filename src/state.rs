//! Shared application state for all routes.

use crate::config::Settings;
use crate::db::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Lifecycle owner; initialized by the entry point before serving.
    pub db: Arc<Database>,
}

impl AppState {
    /// State with an uninitialized database built from `settings.database`.
    pub fn new(settings: Settings) -> Self {
        let db = Database::new(settings.database.clone());
        AppState {
            settings: Arc::new(settings),
            db: Arc::new(db),
        }
    }
}

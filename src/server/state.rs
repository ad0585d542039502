use crate::config::ServerConfig;
use crate::server::error::AppResult;
use crate::storage::{SqliteStorage, StorageError};
use std::sync::{Arc, Mutex};

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; the SQLite connection sits behind one mutex.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(storage: SqliteStorage, config: ServerConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config: Arc::new(config),
        }
    }

    /// Runs `f` against the locked storage on the blocking thread pool.
    pub async fn with_storage<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&SqliteStorage) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&guard)
        })
        .await?
    }
}

//! Shared handler state.

use crate::error::ApiError;
use activity_core::db::open_db;
use activity_core::{EntityKind, Operation, RepoResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Runs repository work on the blocking pool against a freshly opened
    /// connection. The connection is dropped when `work` returns.
    pub async fn run<T, F>(
        &self,
        entity: EntityKind,
        operation: Operation,
        work: F,
    ) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let conn = open_db(db_path.as_path())
                .map_err(|err| ApiError::failed(entity, operation, err))?;
            work(&conn).map_err(|err| ApiError::from_repo(entity, operation, err))
        })
        .await
        .map_err(|err| ApiError::failed(entity, operation, err))?
    }
}

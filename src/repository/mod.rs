mod postgres;
mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use std::sync::Arc;

use crate::models::Note;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Blocking database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Session connection lost after a failed blocking task")]
    SessionLost,

    #[error("Unsupported database url: {0}")]
    UnsupportedUrl(String),
}

/// Hands out one isolated [`NoteSession`] per request.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Acquires a session. It is released when the returned box is dropped,
    /// rolling back anything left uncommitted.
    async fn session(&self) -> Result<Box<dyn NoteSession>, StoreError>;

    /// Creates the `notes` table and its title index if they do not exist.
    async fn init_schema(&self) -> Result<(), StoreError>;

    /// Releases process-wide resources at shutdown.
    async fn close(&self) {}
}

/// A unit of work bound to a single connection.
///
/// Every write is committed before the method returns.
#[async_trait]
pub trait NoteSession: Send {
    async fn insert(&mut self, title: &str, content: &str) -> Result<Note, StoreError>;

    async fn list(&mut self, skip: i64, limit: i64) -> Result<Vec<Note>, StoreError>;

    async fn get(&mut self, id: i64) -> Result<Option<Note>, StoreError>;

    async fn update(
        &mut self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Note>, StoreError>;

    /// Deleting an absent id is a no-op.
    async fn delete(&mut self, id: i64) -> Result<(), StoreError>;
}

/// Opens the store named by `database_url`.
///
/// Accepted forms: `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>`,
/// `postgres://...` and `postgresql://...`.
pub async fn open(
    database_url: &str,
    max_connections: u32,
) -> Result<Arc<dyn NoteStore>, StoreError> {
    if database_url == "sqlite::memory:" {
        tracing::info!("Using in-memory SQLite database");
        return Ok(Arc::new(SqliteStore::memory()?));
    }

    if let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    {
        tracing::info!("Using SQLite database at {}", path);
        return Ok(Arc::new(SqliteStore::file(path, max_connections)?));
    }

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        tracing::info!("Using PostgreSQL database");
        return Ok(Arc::new(PgStore::connect(database_url).await?));
    }

    Err(StoreError::UnsupportedUrl(database_url.to_string()))
}

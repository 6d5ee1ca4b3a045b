use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use std::{path::Path, time::Duration};

use super::{NoteSession, NoteStore, StoreError};
use crate::models::Note;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    );
    CREATE INDEX IF NOT EXISTS ix_notes_title ON notes (title);
";

/// How long a writer waits on a locked database. Statements run on the
/// blocking pool, so the wait never holds a runtime worker.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled SQLite store. In-memory databases get a single long-lived
/// connection so that every session sees the same data.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn file(path: impl AsRef<Path>, max_connections: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")
        });

        let pool = Pool::builder()
            .max_size(max_connections.max(1))
            .build(manager)?;

        Ok(Self { pool })
    }

    pub fn memory() -> Result<Self, StoreError> {
        let pool = Pool::builder()
            .max_size(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .build(SqliteConnectionManager::memory())?;

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        let pool = self.pool.clone();
        Ok(tokio::task::spawn_blocking(move || pool.get()).await??)
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn session(&self) -> Result<Box<dyn NoteSession>, StoreError> {
        let conn = self.connection().await?;
        Ok(Box::new(SqliteSession { conn: Some(conn) }))
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || conn.execute_batch(SCHEMA)).await??;
        tracing::info!("SQLite schema ready");
        Ok(())
    }
}

/// Holds its connection between calls; each statement runs on the blocking
/// pool and hands the connection back when it finishes.
struct SqliteSession {
    conn: Option<PooledConnection<SqliteConnectionManager>>,
}

impl SqliteSession {
    async fn run<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let mut conn = self.conn.take().ok_or(StoreError::SessionLost)?;

        let (conn, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut conn);
            (conn, result)
        })
        .await?;

        self.conn = Some(conn);
        Ok(result?)
    }
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

#[async_trait]
impl NoteSession for SqliteSession {
    async fn insert(&mut self, title: &str, content: &str) -> Result<Note, StoreError> {
        let (title, content) = (title.to_string(), content.to_string());

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let note = tx.query_row(
                "INSERT INTO notes (title, content) VALUES (?1, ?2) RETURNING id, title, content, created_at",
                params![title, content],
                note_from_row,
            )?;
            tx.commit()?;

            Ok(note)
        })
        .await
    }

    async fn list(&mut self, skip: i64, limit: i64) -> Result<Vec<Note>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, created_at FROM notes ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;
            let notes = stmt
                .query_map(params![limit, skip], note_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(notes)
        })
        .await
    }

    async fn get(&mut self, id: i64) -> Result<Option<Note>, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, title, content, created_at FROM notes WHERE id = ?1",
                params![id],
                note_from_row,
            )
            .optional()
        })
        .await
    }

    async fn update(
        &mut self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Note>, StoreError> {
        let title = title.map(ToString::to_string);
        let content = content.map(ToString::to_string);

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let note = tx
                .query_row(
                    "UPDATE notes SET title = COALESCE(?1, title), content = COALESCE(?2, content) \
                     WHERE id = ?3 RETURNING id, title, content, created_at",
                    params![title, content, id],
                    note_from_row,
                )
                .optional()?;
            tx.commit()?;

            Ok(note)
        })
        .await
    }

    async fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
            tx.commit()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DurationRound, TimeDelta, Utc};
    use tempfile::TempDir;

    async fn file_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::file(dir.path().join("notes.db"), 4).unwrap();
        store.init_schema().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let (_dir, store) = file_store().await;

        store
            .session()
            .await
            .unwrap()
            .insert("kept", "across init")
            .await
            .unwrap();

        store.init_schema().await.unwrap();

        let notes = store.session().await.unwrap().list(0, 10).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "kept");
    }

    #[tokio::test]
    async fn init_schema_creates_title_index() {
        let (_dir, store) = file_store().await;

        let conn = store.connection().await.unwrap();
        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'notes'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(indexes.contains(&"ix_notes_title".to_string()));
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_timestamp() {
        let (_dir, store) = file_store().await;
        let mut session = store.session().await.unwrap();

        let before = Utc::now()
            .duration_trunc(TimeDelta::milliseconds(1))
            .unwrap();
        let first = session.insert("a", "1").await.unwrap();
        let second = session.insert("b", "2").await.unwrap();

        assert!(second.id > first.id);
        assert!(first.created_at >= before);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let (_dir, store) = file_store().await;
        let mut session = store.session().await.unwrap();

        let first = session.insert("a", "1").await.unwrap();
        session.delete(first.id).await.unwrap();
        let second = session.insert("b", "2").await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn writes_are_visible_to_other_sessions() {
        let (_dir, store) = file_store().await;

        let created = store
            .session()
            .await
            .unwrap()
            .insert("shared", "row")
            .await
            .unwrap();

        let fetched = store.session().await.unwrap().get(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let (_dir, store) = file_store().await;
        let mut session = store.session().await.unwrap();

        for i in 1..=5 {
            session.insert(&format!("note {i}"), "body").await.unwrap();
        }

        let page = session.list(1, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["note 2", "note 3"]);

        assert!(session.list(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let (_dir, store) = file_store().await;
        let mut session = store.session().await.unwrap();

        let note = session.insert("title", "content").await.unwrap();
        let updated = session
            .update(note.id, None, Some("changed"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "changed");
        assert_eq!(updated.created_at, note.created_at);

        assert_eq!(session.update(note.id + 1, Some("x"), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_row_is_noop() {
        let (_dir, store) = file_store().await;
        let mut session = store.session().await.unwrap();

        session.delete(42).await.unwrap();
        assert_eq!(session.get(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_shares_one_database() {
        let store = SqliteStore::memory().unwrap();
        store.init_schema().await.unwrap();

        {
            let mut session = store.session().await.unwrap();
            session.insert("in", "memory").await.unwrap();
        }

        let notes = store.session().await.unwrap().list(0, 10).await.unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn failed_statement_keeps_connection_in_session() {
        let store = SqliteStore::memory().unwrap();
        let mut session = store.session().await.unwrap();

        // No schema yet: both calls fail at the database, not for a lost connection.
        assert!(matches!(
            session.insert("t", "c").await,
            Err(StoreError::Sqlite(_))
        ));
        assert!(matches!(session.get(1).await, Err(StoreError::Sqlite(_))));
    }
}

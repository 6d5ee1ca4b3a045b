use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_postgres::{Client, NoTls, Row};

use std::sync::Arc;

use super::{NoteSession, NoteStore, StoreError};
use crate::models::Note;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS notes (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE INDEX IF NOT EXISTS ix_notes_title ON notes (title);
";

/// PostgreSQL store over a single client. Sessions take the client
/// exclusively for their lifetime.
pub struct PgStore {
    client: Arc<Mutex<Client>>,
}

impl PgStore {
    pub async fn connect(database_dsn: &str) -> Result<Self, StoreError> {
        let (client, con) = tokio_postgres::connect(database_dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
        })
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn session(&self) -> Result<Box<dyn NoteSession>, StoreError> {
        let client = self.client.clone().lock_owned().await;
        Ok(Box::new(PgSession { client }))
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.client.lock().await.batch_execute(SCHEMA).await?;
        tracing::info!("PostgreSQL schema ready");
        Ok(())
    }
}

struct PgSession {
    client: OwnedMutexGuard<Client>,
}

fn note_from_row(row: &Row) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl NoteSession for PgSession {
    async fn insert(&mut self, title: &str, content: &str) -> Result<Note, StoreError> {
        let tx = self.client.transaction().await?;
        let row = tx
            .query_one(
                "INSERT INTO notes (title, content) VALUES ($1, $2) RETURNING id, title, content, created_at",
                &[&title, &content],
            )
            .await?;
        tx.commit().await?;

        Ok(note_from_row(&row))
    }

    async fn list(&mut self, skip: i64, limit: i64) -> Result<Vec<Note>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, title, content, created_at FROM notes ORDER BY id LIMIT $1 OFFSET $2",
                &[&limit, &skip],
            )
            .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn get(&mut self, id: i64) -> Result<Option<Note>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT id, title, content, created_at FROM notes WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn update(
        &mut self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Note>, StoreError> {
        let tx = self.client.transaction().await?;
        let row = tx
            .query_opt(
                "UPDATE notes SET title = COALESCE($1, title), content = COALESCE($2, content) \
                 WHERE id = $3 RETURNING id, title, content, created_at",
                &[&title, &content, &id],
            )
            .await?;
        tx.commit().await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.client.transaction().await?;
        tx.execute("DELETE FROM notes WHERE id = $1", &[&id]).await?;
        tx.commit().await?;

        Ok(())
    }
}

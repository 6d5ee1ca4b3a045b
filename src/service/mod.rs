use crate::{
    dto::{ListParams, NoteCreate, NoteResponse, NoteUpdate},
    repository::{NoteStore, StoreError},
};

use std::sync::Arc;

/// Runs each operation inside its own session. The session is dropped,
/// and with it released, when the method returns on any path.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub async fn create_note(&self, request: NoteCreate) -> Result<NoteResponse, StoreError> {
        let mut session = self.store.session().await?;

        session
            .insert(&request.title, &request.content)
            .await
            .map(NoteResponse::from)
    }

    pub async fn get_all_notes(&self, params: ListParams) -> Result<Vec<NoteResponse>, StoreError> {
        let mut session = self.store.session().await?;

        session
            .list(params.skip, params.limit)
            .await
            .map(|notes| notes.into_iter().map(NoteResponse::from).collect())
    }

    pub async fn get_one_note(&self, id: i64) -> Result<Option<NoteResponse>, StoreError> {
        let mut session = self.store.session().await?;

        session
            .get(id)
            .await
            .map(|note| note.map(NoteResponse::from))
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: NoteUpdate,
    ) -> Result<Option<NoteResponse>, StoreError> {
        let mut session = self.store.session().await?;

        session
            .update(id, request.title.as_deref(), request.content.as_deref())
            .await
            .map(|note| note.map(NoteResponse::from))
    }

    /// Looks the note up first; `false` means there was nothing to delete.
    pub async fn delete_note(&self, id: i64) -> Result<bool, StoreError> {
        let mut session = self.store.session().await?;

        if session.get(id).await?.is_none() {
            return Ok(false);
        }

        session.delete(id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteStore;

    async fn service() -> NoteService {
        let store = SqliteStore::memory().unwrap();
        store.init_schema().await.unwrap();
        NoteService::new(Arc::new(store))
    }

    fn create(title: &str, content: &str) -> NoteCreate {
        NoteCreate {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = service().await;

        let created = service
            .create_note(create("Meeting Notes", "Q1 roadmap"))
            .await
            .unwrap();
        let fetched = service.get_one_note(created.id).await.unwrap();

        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn delete_looks_before_deleting() {
        let service = service().await;
        let note = service.create_note(create("t", "c")).await.unwrap();

        assert!(service.delete_note(note.id).await.unwrap());
        assert!(!service.delete_note(note.id).await.unwrap());
        assert_eq!(service.get_one_note(note.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sessions_are_released_between_calls() {
        // In-memory pool has one connection; a leaked session blocks the next call.
        let service = service().await;

        for i in 0..10 {
            service.create_note(create(&i.to_string(), "x")).await.unwrap();
            let _ = service.get_one_note(i64::MAX).await.unwrap();
        }

        let notes = service.get_all_notes(ListParams::default()).await.unwrap();
        assert_eq!(notes.len(), 10);
    }
}

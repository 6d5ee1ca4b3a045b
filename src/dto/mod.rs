mod validation;

pub use validation::{FieldError, Validate};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use std::collections::HashMap;

use crate::models::Note;

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
    /// Insertion time, assigned by the store
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteCreate {
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
}

impl Validate for NoteCreate {
    fn validate(body: &Value) -> Result<Self, Vec<FieldError>> {
        let object = validation::as_object(body)?;
        let mut errors = Vec::new();

        let title = validation::required_string(object, "title", &mut errors);
        let content = validation::required_string(object, "content", &mut errors);

        match (title, content) {
            (Some(title), Some(content)) if errors.is_empty() => Ok(Self { title, content }),
            _ => Err(errors),
        }
    }
}

/// Partial update: only supplied fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteUpdate {
    /// New title, left unchanged when absent
    pub title: Option<String>,
    /// New content, left unchanged when absent
    pub content: Option<String>,
}

impl Validate for NoteUpdate {
    fn validate(body: &Value) -> Result<Self, Vec<FieldError>> {
        let object = validation::as_object(body)?;
        let mut errors = Vec::new();

        let title = validation::optional_string(object, "title", &mut errors);
        let content = validation::optional_string(object, "content", &mut errors);

        if errors.is_empty() {
            Ok(Self { title, content })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Number of notes to skip
    #[param(default = 0, minimum = 0)]
    pub skip: i64,
    /// Maximum number of notes to return, capped at 100
    #[param(default = 100, minimum = 0, maximum = 100)]
    pub limit: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListParams {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let skip = validation::non_negative_param(query.get("skip"), "skip", 0, &mut errors);
        let limit = validation::non_negative_param(
            query.get("limit"),
            "limit",
            DEFAULT_LIST_LIMIT,
            &mut errors,
        );

        if errors.is_empty() {
            Ok(Self {
                skip,
                limit: limit.min(MAX_LIST_LIMIT),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub detail: Vec<FieldError>,
}

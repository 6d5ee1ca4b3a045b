mod error;
mod extract;

use error::ApiError;
use extract::ValidJson;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::{collections::HashMap, sync::Arc};

use crate::{
    dto::{
        ErrorResponse, FieldError, ListParams, MessageResponse, NoteCreate, NoteResponse,
        NoteUpdate, ValidationErrorResponse,
    },
    service::NoteService,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notes API",
        version = "0.1.0",
        description = "A simple REST API for managing text notes"
    ),
    paths(
        root,
        create_note,
        get_all_notes,
        get_one_note,
        update_note,
        delete_note
    ),
    components(schemas(
        NoteResponse,
        NoteCreate,
        NoteUpdate,
        MessageResponse,
        ErrorResponse,
        ValidationErrorResponse,
        FieldError
    )),
    tags(
        (name = "notes", description = "Notes management API"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn router(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/notes", get(get_all_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_one_note).patch(update_note).delete(delete_note),
        )
        .route("/openapi.json", get(openapi))
        // Note bodies have no length limit.
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn note_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|e| {
        tracing::debug!("rejected note id: {e}");
        ApiError::Validation(vec![FieldError::int_parsing(&["path", "id"])])
    })
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse)
    ),
    tag = "health"
)]
#[debug_handler]
pub async fn root() -> Response {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Welcome to Notes API".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = NoteCreate,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    ValidJson(payload): ValidJson<NoteCreate>,
) -> Response {
    match service.create_note(payload).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => {
            tracing::error!("failed to create note entry: {}", e);
            ApiError::Internal("Failed to create note").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    params(ListParams),
    responses(
        (status = 200, description = "Notes in insertion order", body = Vec<NoteResponse>),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(
    State(service): State<Arc<NoteService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = match ListParams::from_query(&query) {
        Ok(params) => params,
        Err(errors) => return ApiError::Validation(errors).into_response(),
    };

    match service.get_all_notes(params).await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => {
            tracing::error!("failed to get note entries: {}", e);
            ApiError::Internal("Failed to get notes").into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match note_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match service.get_one_note(id).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => ApiError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to get note entry: {}", e);
            ApiError::Internal("Failed to get note").into_response()
        }
    }
}

#[utoipa::path(
    patch,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    path: Result<Path<i64>, PathRejection>,
    ValidJson(payload): ValidJson<NoteUpdate>,
) -> Response {
    let id = match note_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match service.update_note(id, payload).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => ApiError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to update note entry: {}", e);
            ApiError::Internal("Failed to update note").into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let id = match note_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match service.delete_note(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => ApiError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to delete note entry: {}", e);
            ApiError::Internal("Failed to delete note").into_response()
        }
    }
}

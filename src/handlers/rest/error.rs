use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::dto::{ErrorResponse, FieldError, ValidationErrorResponse};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),

    #[error("Note not found")]
    NotFound,

    /// Storage failure; the cause is logged where it happens.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Validation(detail) => {
                (status, Json(ValidationErrorResponse { detail })).into_response()
            }
            other => (
                status,
                Json(ErrorResponse {
                    detail: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

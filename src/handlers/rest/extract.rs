use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::error::ApiError;
use crate::dto::{FieldError, Validate};

/// JSON body checked with [`Validate`] before the handler runs.
///
/// Malformed JSON and schema violations are both answered with 422.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: Validate + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::Validation(vec![FieldError::json_invalid(&e.to_string())]).into_response()
        })?;

        T::validate(&body)
            .map(ValidJson)
            .map_err(|errors| ApiError::Validation(errors).into_response())
    }
}

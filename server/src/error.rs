use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plainly_core::PipelineError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Pipeline(PipelineError::InputTooLarge { .. }) => (StatusCode::PAYLOAD_TOO_LARGE, "input_too_large"),
            ApiError::Pipeline(PipelineError::InvalidLevel(_)) => (StatusCode::BAD_REQUEST, "invalid_level"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(ErrorBody { error: kind, message: self.to_string() })).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use companies_infra::StoreError;

/// Per-request failure, answered as a plaintext body carrying the raw message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not supported")]
    MethodNotSupported,

    /// The request body could not be read or decoded.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Insert(StoreError),

    #[error("{0}")]
    Query(StoreError),

    /// No session could be checked out for this request.
    #[error("{0}")]
    SessionUnavailable(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) | ApiError::Insert(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SessionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        text_error(self.status(), self.to_string())
    }
}

pub fn text_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}

//! Error types for famcal-api

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use famcal_conflict::ConflictError;

/// famcal-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Scan(#[from] ConflictError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Scan(ConflictError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Scan(ConflictError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Scan(ConflictError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Scan(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned to callers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

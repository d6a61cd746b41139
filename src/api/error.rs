//! API error type and HTTP status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::types::ErrorResponse;
use crate::archive::ArchiveError;
use crate::normals::NormalsError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown observation type: {0}")]
    UnknownObservation(String),
    #[error("archive is empty")]
    EmptyArchive,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("normals lookup failed: {0}")]
    Upstream(String),
}

impl From<ArchiveError> for ApiError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::UnknownObservation(name) => ApiError::UnknownObservation(name),
            ArchiveError::InvalidQuery(msg) => ApiError::BadRequest(msg),
            ArchiveError::Database(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<NormalsError> for ApiError {
    fn from(e: NormalsError) -> Self {
        match e {
            NormalsError::OutsideConus { .. } => ApiError::BadRequest(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownObservation(_) | ApiError::EmptyArchive | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

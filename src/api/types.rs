//! API request/response types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Multipart field names accepted by the upload route, raw shots in order
pub const RAW_FIELDS: [&str; 3] = ["raw1", "raw2", "raw3"];

/// Multipart field holding the composited collage
pub const COLLAGE_FIELD: &str = "collage";

/// Body returned by `POST /api/save`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub ok: bool,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Missing when an older or foreign server omits it
    #[serde(rename = "collageUrl", default, skip_serializing_if = "Option::is_none")]
    pub collage_url: Option<String>,
}

/// Errors reported by the upload route as plain-text responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No collage file received")]
    MissingCollage,
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
    #[error("File too large: {field} exceeds {limit} bytes")]
    FileTooLarge { field: String, limit: usize },
    #[error("Malformed upload: {0}")]
    Malformed(String),
    #[error("Server error while saving files")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCollage
            | ApiError::DuplicateField(_)
            | ApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Storage(e) => tracing::error!(error = %e, "Error in /api/save"),
            other => tracing::warn!(error = %other, "Rejected upload"),
        }
        (self.status(), self.to_string()).into_response()
    }
}

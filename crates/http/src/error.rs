//! Error envelope for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Uniform error envelope returned by every failing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Numeric HTTP status code
    pub error: u16,
    /// Fixed human-readable message for the status
    pub message: String,
}

/// The only failure kinds the API ever reports.
///
/// Handlers fold every internal failure into one of these before it reaches
/// the wire; nothing else leaks out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,

    #[error("resource not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("unprocessable")]
    Unprocessable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.status().as_u16(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        tracing::debug!(
            status_code = %status.as_u16(),
            message = %self,
            "request error"
        );

        (status, Json(self.body())).into_response()
    }
}

/// Fallback for paths no module serves
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for a known path hit with a method it does not serve
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

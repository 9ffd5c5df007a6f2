use bookshelf_http::ApiError;
use thiserror::Error;

/// Failures raised inside a books handler before they are translated.
///
/// Each handler collapses every variant into its own single outward
/// [`ApiError`]; a missing book during an update therefore still answers
/// 400, and during a delete 422.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("book {0} not found")]
    NotFound(u64),

    #[error("rating {0} is not an integer")]
    InvalidRating(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl BookError {
    /// Log the underlying cause and fold it into `kind`.
    pub fn collapse(self, kind: ApiError, operation: &'static str) -> ApiError {
        tracing::warn!(
            operation,
            error = %self,
            status_code = %kind.status().as_u16(),
            "books request failed"
        );
        kind
    }
}

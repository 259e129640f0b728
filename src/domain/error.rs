use thiserror::Error;

/// Failures of a streaming call, shared by every layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("video not found: {video_id}")]
    NotFound { video_id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// Cooperative teardown. Never reported to an end user as a failure.
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    pub fn not_found(video_id: impl Into<String>) -> Self {
        StreamError::NotFound {
            video_id: video_id.into(),
        }
    }

    pub fn internal(reason: impl ToString) -> Self {
        StreamError::Internal(reason.to_string())
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Internal(err.to_string())
    }
}

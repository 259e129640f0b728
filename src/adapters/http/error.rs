//! Error-to-HTTP response conversion for the gateway.

use crate::domain::StreamError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A pre-stream failure, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StreamError> for ApiError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Video not found"),
            StreamError::InvalidRequest(reason) => Self::bad_request(reason),
            StreamError::Internal(reason) => {
                tracing::error!(reason = %reason, "video stream failed before first chunk");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream video")
            }
            StreamError::Cancelled => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Stream cancelled")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts `ERROR` events.
    struct ErrorEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_not_found_produces_404() {
        let err = ApiError::from(StreamError::not_found("abc"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_hides_reason() {
        let err = ApiError::from(StreamError::internal("/srv/videos/a.mp4: permission denied"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to stream video");
    }

    #[test]
    fn test_invalid_request_produces_400() {
        let err = ApiError::from(StreamError::InvalidRequest("bad quality".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "bad quality");
    }

    #[test]
    fn test_pre_stream_failure_is_logged_once() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorEvents(errors.clone()));

        let status = tracing::subscriber::with_default(subscriber, || {
            ApiError::from(StreamError::internal("disk went away"))
                .into_response()
                .status()
        });

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}

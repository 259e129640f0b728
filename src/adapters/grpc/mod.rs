//! gRPC adapter: the Streaming Transport Endpoint on the wire.
//!
//! - `server`: serves `VideoService/StreamVideo` from a `VideoStreamer`
//! - `client`: `VideoTransport` backed by a tonic channel

pub mod client;
pub mod proto;
pub mod server;

/// Generated by `build.rs`.
pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/video.VideoService.rs"));
}

pub use client::GrpcTransport;
pub use server::{serve, GrpcVideoService};

use crate::domain::StreamError;
use tonic::{Code, Status};

impl From<StreamError> for Status {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::NotFound { video_id } => {
                Status::not_found(format!("video not found: {}", video_id))
            }
            StreamError::InvalidRequest(reason) => Status::invalid_argument(reason),
            StreamError::Internal(reason) => Status::internal(reason),
            StreamError::Cancelled => Status::cancelled("stream cancelled"),
        }
    }
}

/// Map a status received for `video_id` back into the domain.
pub fn status_to_error(status: Status, video_id: &str) -> StreamError {
    match status.code() {
        Code::NotFound => StreamError::not_found(video_id),
        Code::InvalidArgument => StreamError::InvalidRequest(status.message().to_string()),
        Code::Cancelled => StreamError::Cancelled,
        _ => StreamError::internal(format!("{:?}: {}", status.code(), status.message())),
    }
}

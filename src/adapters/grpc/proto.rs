//! Wire messages for the `video.VideoService` gRPC contract.
//!
//! Kept in sync by hand with `proto/video.proto`.

use crate::domain::{Chunk, StreamError, VideoRequest};

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamVideoRequest {
    #[prost(string, tag = "1")]
    pub video_id: String,
    #[prost(int32, tag = "2")]
    pub quality: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct VideoChunk {
    #[prost(bytes = "bytes", tag = "1")]
    pub data: bytes::Bytes,
    #[prost(int64, tag = "2")]
    pub sequence_number: i64,
    #[prost(bool, tag = "3")]
    pub is_last_chunk: bool,
    #[prost(string, tag = "4")]
    pub mime_type: String,
}

impl From<VideoRequest> for StreamVideoRequest {
    fn from(request: VideoRequest) -> Self {
        Self {
            video_id: request.video_id,
            quality: request.quality,
        }
    }
}

impl From<StreamVideoRequest> for VideoRequest {
    fn from(request: StreamVideoRequest) -> Self {
        VideoRequest::new(request.video_id, request.quality)
    }
}

impl From<Chunk> for VideoChunk {
    fn from(chunk: Chunk) -> Self {
        Self {
            data: chunk.data,
            sequence_number: chunk.sequence_number as i64,
            is_last_chunk: chunk.is_last,
            mime_type: chunk.mime_type,
        }
    }
}

impl TryFrom<VideoChunk> for Chunk {
    type Error = StreamError;

    fn try_from(chunk: VideoChunk) -> Result<Self, Self::Error> {
        let sequence_number = u64::try_from(chunk.sequence_number).map_err(|_| {
            StreamError::internal(format!(
                "negative sequence number {}",
                chunk.sequence_number
            ))
        })?;
        if chunk.is_last_chunk && !chunk.data.is_empty() {
            return Err(StreamError::internal(format!(
                "terminal chunk {} carries {} bytes",
                sequence_number,
                chunk.data.len()
            )));
        }
        Ok(Chunk {
            sequence_number,
            data: chunk.data,
            is_last: chunk.is_last_chunk,
            mime_type: chunk.mime_type,
        })
    }
}

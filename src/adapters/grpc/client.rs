use super::pb::video_service_client::VideoServiceClient;
use super::proto::StreamVideoRequest;
use super::status_to_error;
use crate::domain::{Chunk, StreamError, VideoRequest};
use crate::ports::transport::{ChunkStream, VideoTransport};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// `VideoTransport` over gRPC.
///
/// One channel is shared by every call; it connects on first use and
/// reconnects on its own after failures.
#[derive(Clone)]
pub struct GrpcTransport {
    client: VideoServiceClient<Channel>,
}

impl GrpcTransport {
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self, StreamError> {
        let endpoint = Endpoint::from_shared(endpoint.into())
            .map_err(|e| StreamError::internal(format!("invalid gRPC endpoint: {}", e)))?;
        Ok(Self {
            client: VideoServiceClient::new(endpoint.connect_lazy()),
        })
    }
}

#[async_trait]
impl VideoTransport for GrpcTransport {
    async fn stream_video(
        &self,
        request: VideoRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, StreamError> {
        let video_id = request.video_id.clone();
        let mut client = self.client.clone();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            response = client.stream_video(StreamVideoRequest::from(request)) => response,
        };
        let chunks = response
            .map_err(|status| status_to_error(status, &video_id))?
            .into_inner();
        debug!(video_id = %video_id, "gRPC stream opened");

        // Dropping the tonic stream resets the HTTP/2 stream, which is what
        // tears the remote session down.
        let chunks = chunks
            .map(move |item| match item {
                Ok(chunk) => Chunk::try_from(chunk),
                Err(status) => Err(status_to_error(status, &video_id)),
            })
            .take_until(cancel.cancelled_owned());
        Ok(chunks.boxed())
    }
}

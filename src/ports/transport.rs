use crate::domain::{Chunk, StreamError, VideoRequest};
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

/// Chunks of one streaming call, in sequence order.
///
/// A mid-stream failure shows up as a single `Err` item, after which the
/// stream ends.
pub type ChunkStream = BoxStream<'static, Result<Chunk, StreamError>>;

/// Caller side of the Streaming Transport Endpoint.
#[async_trait]
pub trait VideoTransport: Send + Sync {
    /// Open one streaming call.
    ///
    /// Failures known before the first chunk (unknown id, unreachable
    /// endpoint, unopenable file) are returned as `Err`. Cancelling `cancel`
    /// ends the returned stream and tears down the remote session.
    async fn stream_video(
        &self,
        request: VideoRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, StreamError>;
}

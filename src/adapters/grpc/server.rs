use super::pb::video_service_server::{VideoService, VideoServiceServer};
use super::proto::{StreamVideoRequest, VideoChunk};
use crate::application::VideoStreamer;
use crate::domain::VideoRequest;
use crate::ports::registry::AssetRegistry;
use crate::ports::source::ByteSourceOpener;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

/// `VideoService` implementation over a shared `VideoStreamer`.
pub struct GrpcVideoService<R, O> {
    streamer: Arc<VideoStreamer<R, O>>,
}

impl<R, O> GrpcVideoService<R, O> {
    pub fn new(streamer: Arc<VideoStreamer<R, O>>) -> Self {
        Self { streamer }
    }
}

#[tonic::async_trait]
impl<R, O> VideoService for GrpcVideoService<R, O>
where
    R: AssetRegistry + 'static,
    O: ByteSourceOpener + 'static,
{
    type StreamVideoStream = BoxStream<'static, Result<VideoChunk, Status>>;

    async fn stream_video(
        &self,
        request: Request<StreamVideoRequest>,
    ) -> Result<Response<Self::StreamVideoStream>, Status> {
        let remote = request.remote_addr();
        let request = VideoRequest::from(request.into_inner());
        debug!(?remote, video_id = %request.video_id, quality = request.quality, "StreamVideo call");

        // The session notices the caller going away when tonic drops this
        // stream, so no caller token is needed here.
        let handle = self
            .streamer
            .open_session(request, CancellationToken::new())
            .await?;

        let chunks = handle
            .into_stream()
            .map(|item| item.map(VideoChunk::from).map_err(Status::from));
        Ok(Response::new(chunks.boxed()))
    }
}

/// Serve the video service on `listener` until `shutdown` is cancelled.
pub async fn serve<R, O>(
    listener: TcpListener,
    streamer: Arc<VideoStreamer<R, O>>,
    shutdown: CancellationToken,
) -> Result<(), tonic::transport::Error>
where
    R: AssetRegistry + 'static,
    O: ByteSourceOpener + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "gRPC video service listening");
    Server::builder()
        .add_service(VideoServiceServer::new(GrpcVideoService::new(streamer)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.cancelled_owned())
        .await
}

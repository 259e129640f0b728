use super::error::ApiError;
use crate::domain::{Chunk, StreamError, VideoRequest, DEFAULT_QUALITY};
use crate::ports::transport::{ChunkStream, VideoTransport};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct GatewayState {
    transport: Arc<dyn VideoTransport>,
    default_quality: i32,
}

impl GatewayState {
    pub fn new(transport: Arc<dyn VideoTransport>) -> Self {
        Self {
            transport,
            default_quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_default_quality(mut self, quality: i32) -> Self {
        self.default_quality = quality;
        self
    }
}

pub fn router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/video", get(stream_video))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "HTTP gateway listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub quality: Option<String>,
}

impl VideoQuery {
    pub fn into_request(self, default_quality: i32) -> Result<VideoRequest, ApiError> {
        let video_id = self
            .video_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("Video ID is required"))?;

        let quality = match self.quality.as_deref().map(str::trim) {
            None | Some("") => default_quality,
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid quality: {}", raw)))?,
        };

        Ok(VideoRequest::new(video_id, quality))
    }
}

/// `GET /video?videoId=<id>&quality=<int>`
///
/// Errors before the first chunk become a JSON error response. Once the first
/// chunk has arrived the headers are committed, so later failures abort the
/// body instead.
pub async fn stream_video(
    State(state): State<GatewayState>,
    query: Result<Query<VideoQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = query.into_request(state.default_quality)?;
    let video_id = request.video_id.clone();
    info!(video_id = %video_id, quality = request.quality, "video requested");

    // Cancelled when the response body is dropped, i.e. when the client
    // goes away or the stream ends.
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let mut chunks = state.transport.stream_video(request, cancel).await?;
    let first = match chunks.next().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(err)) => return Err(err.into()),
        None => {
            return Err(StreamError::internal("stream ended before the first chunk").into())
        }
    };

    let mime_type = first.mime_type.clone();
    let body = Body::from_stream(relay(video_id, first, chunks, guard));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::TRANSFER_ENCODING, "chunked")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .map_err(|e| StreamError::internal(e).into())
}

/// Forward chunk payloads in order until the terminal chunk.
///
/// A transport error or a sequence gap yields an `Err`, which makes the
/// server abort the response instead of finishing it cleanly.
fn relay(
    video_id: String,
    first: Chunk,
    mut rest: ChunkStream,
    guard: DropGuard,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    async_stream::stream! {
        let _guard = guard;
        let mut expected = 0u64;
        let mut pending = Some(first);

        loop {
            let chunk = match pending.take() {
                Some(chunk) => chunk,
                None => match rest.next().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(err)) => {
                        error!(video_id = %video_id, error = %err, "aborting video response");
                        yield Err(io::Error::new(io::ErrorKind::Other, err));
                        break;
                    }
                    None => {
                        debug!(video_id = %video_id, "transport completed");
                        break;
                    }
                },
            };

            if chunk.sequence_number != expected {
                error!(
                    video_id = %video_id,
                    expected,
                    received = chunk.sequence_number,
                    "chunk out of sequence"
                );
                yield Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("expected chunk {}, got {}", expected, chunk.sequence_number),
                ));
                break;
            }
            expected += 1;

            if chunk.is_last {
                info!(video_id = %video_id, chunks = expected, "video response complete");
                break;
            }
            if !chunk.data.is_empty() {
                yield Ok(chunk.data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::{FsOpener, StaticRegistry};
    use crate::application::VideoStreamer;
    use crate::domain::VideoAsset;
    use crate::test_support::{fixture_bytes, write_fixture, CountingOpener, FailingOpener, OpenStats};
    use async_trait::async_trait;
    use axum::http::Request;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn gateway_with_fixture(len: usize) -> (TempDir, Vec<u8>, Router, OpenStats) {
        let dir = tempdir().unwrap();
        let data = fixture_bytes(len);
        let path = write_fixture(dir.path(), "sample.mp4", &data);
        let registry = StaticRegistry::new([VideoAsset::from_path("sample", path)]);
        let (opener, stats) = CountingOpener::new(FsOpener);
        let streamer = VideoStreamer::new(registry, opener);
        let app = router(GatewayState::new(Arc::new(streamer)));
        (dir, data, app, stats)
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_streams_fixture_with_headers() {
        let (_dir, data, app, stats) = gateway_with_fixture(150 * 1024);

        let response = get(app, "/video?videoId=sample&quality=1").await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(headers[header::TRANSFER_ENCODING], "chunked");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), data.as_slice());
        assert!(stats.wait_closed(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_empty_asset_streams_empty_body() {
        let (_dir, _data, app, _stats) = gateway_with_fixture(0);

        let response = get(app, "/video?videoId=sample").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_video_id_is_400() {
        let (_dir, _data, app, stats) = gateway_with_fixture(10);

        for uri in ["/video", "/video?videoId=", "/video?quality=3"] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = json_body(response).await;
            assert_eq!(body["error"], "Video ID is required");
        }
        assert_eq!(stats.opened(), 0);
    }

    #[tokio::test]
    async fn test_malformed_quality_is_400() {
        let (_dir, _data, app, stats) = gateway_with_fixture(10);

        let response = get(app, "/video?videoId=sample&quality=high").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid quality: high");
        assert_eq!(stats.opened(), 0);
    }

    #[tokio::test]
    async fn test_unknown_video_is_404_json() {
        let (_dir, _data, app, _stats) = gateway_with_fixture(10);

        let response = get(app, "/video?videoId=unknown").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = json_body(response).await;
        assert_eq!(body["error"], "Video not found");
    }

    #[tokio::test]
    async fn test_failure_before_first_chunk_is_500_json() {
        let registry = StaticRegistry::new([VideoAsset::new("broken", "broken.mp4", "video/mp4")]);
        let streamer = VideoStreamer::new(registry, FailingOpener { prefix: Vec::new() });
        let app = router(GatewayState::new(Arc::new(streamer)));

        let response = get(app, "/video?videoId=broken").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to stream video");
    }

    #[tokio::test]
    async fn test_failure_mid_stream_aborts_body() {
        let registry = StaticRegistry::new([VideoAsset::new("broken", "broken.mp4", "video/mp4")]);
        let opener = FailingOpener {
            prefix: fixture_bytes(100 * 1024),
        };
        let streamer = VideoStreamer::new(registry, opener);
        let app = router(GatewayState::new(Arc::new(streamer)));

        let response = get(app, "/video?videoId=broken").await;

        // Headers were committed with the first chunk.
        assert_eq!(response.status(), StatusCode::OK);
        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 64 * 1024);
        assert!(body.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_client_disconnect_releases_file_handle() {
        let (_dir, _data, app, stats) = gateway_with_fixture(8 * 1024 * 1024);

        let response = get(app, "/video?videoId=sample").await;
        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 64 * 1024);
        assert_eq!(stats.open_now(), 1);

        drop(body);

        assert!(stats.wait_closed(Duration::from_secs(2)).await);
        assert!(stats.bytes_read() < 8 * 1024 * 1024);
    }

    /// Replays a fixed list of items, ignoring the request.
    struct ScriptedTransport {
        items: Vec<Result<Chunk, StreamError>>,
    }

    #[async_trait]
    impl VideoTransport for ScriptedTransport {
        async fn stream_video(
            &self,
            _request: VideoRequest,
            _cancel: CancellationToken,
        ) -> Result<ChunkStream, StreamError> {
            Ok(futures::stream::iter(self.items.clone()).boxed())
        }
    }

    #[tokio::test]
    async fn test_sequence_gap_aborts_body() {
        let transport = ScriptedTransport {
            items: vec![
                Ok(Chunk::data(0, Bytes::from_static(b"abc"), "video/mp4")),
                Ok(Chunk::data(2, Bytes::from_static(b"def"), "video/mp4")),
                Ok(Chunk::terminal(3, "video/mp4")),
            ],
        };
        let app = router(GatewayState::new(Arc::new(transport)));

        let response = get(app, "/video?videoId=any").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_nothing_after_terminal_chunk_is_relayed() {
        let transport = ScriptedTransport {
            items: vec![
                Ok(Chunk::data(0, Bytes::from_static(b"abc"), "video/webm")),
                Ok(Chunk::terminal(1, "video/webm")),
                Ok(Chunk::data(2, Bytes::from_static(b"zzz"), "video/webm")),
            ],
        };
        let app = router(GatewayState::new(Arc::new(transport)));

        let response = get(app, "/video?videoId=any").await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/webm");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"abc");
    }

    #[test]
    fn test_query_defaults_quality() {
        let query = VideoQuery {
            video_id: Some("sample".into()),
            quality: None,
        };
        assert_eq!(query.into_request(2).unwrap(), VideoRequest::new("sample", 2));

        let query = VideoQuery {
            video_id: Some("sample".into()),
            quality: Some(" 5 ".into()),
        };
        assert_eq!(query.into_request(2).unwrap(), VideoRequest::new("sample", 5));
    }
}

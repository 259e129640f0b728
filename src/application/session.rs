//! Stream sessions: resolve, open, and pump one asset to one caller.

use super::chunk_source::{ChunkProducer, DEFAULT_CHUNK_SIZE};
use crate::domain::{Chunk, StreamError, VideoRequest};
use crate::ports::registry::AssetRegistry;
use crate::ports::source::ByteSourceOpener;
use crate::ports::transport::{ChunkStream, VideoTransport};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on chunks queued between a session and its caller.
pub const MAX_IN_FLIGHT: usize = 4;

/// Lifecycle of one streaming call. The three end states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Cancelled
        )
    }
}

/// Per-call state binding one request to one open byte source.
struct StreamSession {
    request: VideoRequest,
    state: SessionState,
    /// Session-scoped token; a child of the streamer's shutdown token.
    cancel: CancellationToken,
    /// The streamer's shutdown token.
    shutdown: CancellationToken,
    /// Cancellation requested by the caller.
    caller: CancellationToken,
}

/// Why a session stopped before its terminal chunk.
enum Stop {
    /// The caller went away or asked to stop.
    CallerGone,
    /// The session token fired.
    Interrupted,
}

impl StreamSession {
    fn new(request: VideoRequest, shutdown: &CancellationToken, caller: CancellationToken) -> Self {
        Self {
            request,
            state: SessionState::Idle,
            cancel: shutdown.child_token(),
            shutdown: shutdown.clone(),
            caller,
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.is_terminal() {
            return;
        }
        debug!(
            video_id = %self.request.video_id,
            from = ?self.state,
            to = ?next,
            "session state change"
        );
        self.state = next;
    }

    fn finish(mut self, producer: &mut ChunkProducer, state: SessionState) -> SessionState {
        if state == SessionState::Cancelled {
            producer.cancel();
        }
        self.transition(state);
        match state {
            SessionState::Cancelled => {
                info!(video_id = %self.request.video_id, "video stream cancelled")
            }
            SessionState::Failed => {
                warn!(video_id = %self.request.video_id, "video stream failed")
            }
            _ => info!(video_id = %self.request.video_id, "video stream completed"),
        }
        self.state
    }

    /// Forward chunks to `tx` one at a time.
    ///
    /// The next window is only read once the previous chunk has a slot in
    /// the channel, so a slow caller throttles file reads.
    async fn pump(
        self,
        mut producer: ChunkProducer,
        tx: mpsc::Sender<Result<Chunk, StreamError>>,
    ) -> SessionState {
        loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => Err(Stop::CallerGone),
                _ = self.caller.cancelled() => Err(Stop::CallerGone),
                next = producer.next_chunk() => Ok(next),
            };

            let chunk = match next {
                Err(stop) => return self.stop(producer, &tx, stop).await,
                Ok(Ok(Some(chunk))) => chunk,
                Ok(Ok(None)) => return self.finish(&mut producer, SessionState::Completed),
                Ok(Err(StreamError::Cancelled)) => {
                    return self.stop(producer, &tx, Stop::Interrupted).await
                }
                Ok(Err(err)) => {
                    // Chunks already sent stay valid; the error is the last item.
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {}
                        _ = self.caller.cancelled() => {}
                        _ = tx.send(Err(err)) => {}
                    }
                    return self.finish(&mut producer, SessionState::Failed);
                }
            };

            let permit = tokio::select! {
                biased;
                _ = self.caller.cancelled() => Err(Stop::CallerGone),
                _ = self.cancel.cancelled() => Err(Stop::Interrupted),
                permit = tx.reserve() => permit.map_err(|_| Stop::CallerGone),
            };
            let permit = match permit {
                Ok(permit) => permit,
                Err(stop) => return self.stop(producer, &tx, stop).await,
            };

            let is_last = chunk.is_last;
            permit.send(Ok(chunk));
            if is_last {
                return self.finish(&mut producer, SessionState::Completed);
            }
        }
    }

    /// End a session that stopped short of its terminal chunk.
    ///
    /// A caller that went away gets nothing more. When the server is shutting
    /// down and the caller is still listening, the stream ends with an error so
    /// the cut-off video is not taken for a complete one.
    async fn stop(
        self,
        mut producer: ChunkProducer,
        tx: &mpsc::Sender<Result<Chunk, StreamError>>,
        stop: Stop,
    ) -> SessionState {
        producer.cancel();
        let listening = !tx.is_closed() && !self.caller.is_cancelled();
        if matches!(stop, Stop::Interrupted) && self.shutdown.is_cancelled() && listening {
            warn!(video_id = %self.request.video_id, "server shutting down mid-stream");
            tokio::select! {
                biased;
                _ = tx.closed() => {}
                _ = self.caller.cancelled() => {}
                _ = tx.send(Err(StreamError::internal("server shutting down"))) => {}
            }
        }
        self.finish(&mut producer, SessionState::Cancelled)
    }
}

/// A running session: its chunks, its outcome, and a way to stop it.
pub struct SessionHandle {
    pub chunks: mpsc::Receiver<Result<Chunk, StreamError>>,
    pub outcome: JoinHandle<SessionState>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Stop the session. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The chunk stream, detaching from the session's outcome.
    pub fn into_stream(self) -> ReceiverStream<Result<Chunk, StreamError>> {
        ReceiverStream::new(self.chunks)
    }
}

/// The Streaming Transport Endpoint's core: registry lookup plus one pump
/// task per call.
pub struct VideoStreamer<R, O> {
    registry: R,
    opener: O,
    chunk_size: usize,
    in_flight: usize,
    shutdown: CancellationToken,
}

impl<R, O> VideoStreamer<R, O>
where
    R: AssetRegistry,
    O: ByteSourceOpener,
{
    pub fn new(registry: R, opener: O) -> Self {
        Self {
            registry,
            opener,
            chunk_size: DEFAULT_CHUNK_SIZE,
            in_flight: 1,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bound on queued chunks per session, clamped to `1..=MAX_IN_FLIGHT`.
    pub fn with_in_flight(mut self, in_flight: usize) -> Self {
        self.in_flight = in_flight.clamp(1, MAX_IN_FLIGHT);
        self
    }

    /// Cancelling `shutdown` cancels every session opened afterwards.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Resolve and open the requested asset, then start streaming it.
    ///
    /// `NotFound` and open failures are reported here, before any chunk.
    pub async fn open_session(
        &self,
        request: VideoRequest,
        caller: CancellationToken,
    ) -> Result<SessionHandle, StreamError> {
        let mut session = StreamSession::new(request, &self.shutdown, caller);

        session.transition(SessionState::Resolving);
        let Some(asset) = self.registry.lookup(&session.request.video_id) else {
            session.transition(SessionState::Failed);
            warn!(video_id = %session.request.video_id, "unknown video requested");
            return Err(StreamError::not_found(&session.request.video_id));
        };

        let producer =
            match ChunkProducer::open(&self.opener, &asset, self.chunk_size, session.cancel.clone())
                .await
            {
                Ok(producer) => producer,
                Err(err) => {
                    session.transition(SessionState::Failed);
                    return Err(err);
                }
            };

        info!(
            video_id = %session.request.video_id,
            quality = session.request.quality,
            mime_type = %asset.mime_type,
            "streaming video"
        );
        session.transition(SessionState::Streaming);

        let cancel = session.cancel.clone();
        let (tx, rx) = mpsc::channel(self.in_flight);
        let outcome = tokio::spawn(session.pump(producer, tx));

        Ok(SessionHandle {
            chunks: rx,
            outcome,
            cancel,
        })
    }
}

/// In-process transport: the caller and the session share one runtime.
#[async_trait]
impl<R, O> VideoTransport for VideoStreamer<R, O>
where
    R: AssetRegistry + 'static,
    O: ByteSourceOpener + 'static,
{
    async fn stream_video(
        &self,
        request: VideoRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, StreamError> {
        let handle = self.open_session(request, cancel.clone()).await?;
        Ok(handle
            .into_stream()
            .take_until(cancel.cancelled_owned())
            .boxed())
    }
}

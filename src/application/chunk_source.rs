//! Chunk Source: turns one open byte source into framed chunks.

use crate::domain::{Chunk, StreamError, VideoAsset};
use crate::ports::source::{ByteSource, ByteSourceOpener};
use bytes::Bytes;
use std::io;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

/// Read window used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Pulls fixed-size windows from a byte source, one chunk per call.
///
/// A fresh producer is opened per session; it is not resumable. The producer
/// exclusively owns the byte source and drops it as soon as the stream ends,
/// fails, or is cancelled.
pub struct ChunkProducer {
    source: Option<ByteSource>,
    window: usize,
    mime_type: String,
    next_sequence: u64,
    finished: bool,
    cancel: CancellationToken,
}

impl ChunkProducer {
    /// Open `asset` through `opener`. An open failure is an `Internal` error.
    pub async fn open<O>(
        opener: &O,
        asset: &VideoAsset,
        window: usize,
        cancel: CancellationToken,
    ) -> Result<Self, StreamError>
    where
        O: ByteSourceOpener + ?Sized,
    {
        let source = opener.open(asset).await.map_err(|e| {
            error!(video_id = %asset.id, path = ?asset.path, error = %e, "failed to open video");
            StreamError::internal(e)
        })?;
        Ok(Self::new(source, &asset.mime_type, window, cancel))
    }

    pub fn new(source: ByteSource, mime_type: &str, window: usize, cancel: CancellationToken) -> Self {
        Self {
            source: Some(source),
            window: window.max(1),
            mime_type: mime_type.to_string(),
            next_sequence: 0,
            finished: false,
            cancel,
        }
    }

    /// Produce the next chunk.
    ///
    /// Returns `Ok(None)` once the terminal chunk has been produced. A read
    /// failure yields `Internal` and a cancellation yields `Cancelled`; both
    /// release the source and end the stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, StreamError> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            self.release();
            return Err(StreamError::Cancelled);
        }

        let cancel = self.cancel.clone();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            read = self.read_window() => Some(read),
        };

        match read {
            None => {
                self.release();
                Err(StreamError::Cancelled)
            }
            Some(Err(e)) => {
                error!(sequence = self.next_sequence, error = %e, "video read failed");
                self.release();
                Err(StreamError::internal(e))
            }
            Some(Ok(data)) if data.is_empty() => {
                self.release();
                let chunk = Chunk::terminal(self.advance(), &self.mime_type);
                debug!(sequence = chunk.sequence_number, "end of video reached");
                Ok(Some(chunk))
            }
            Some(Ok(data)) => {
                let chunk = Chunk::data(self.advance(), data, &self.mime_type);
                trace!(sequence = chunk.sequence_number, len = chunk.data.len(), "read chunk");
                Ok(Some(chunk))
            }
        }
    }

    /// Stop producing and drop the byte source. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.release();
    }

    /// Whether the byte source has been dropped.
    pub fn is_released(&self) -> bool {
        self.source.is_none()
    }

    fn advance(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn release(&mut self) {
        self.finished = true;
        self.source = None;
    }

    // Fills a whole window unless EOF comes first, so only the final data
    // chunk can be short. An empty result means EOF.
    async fn read_window(&mut self) -> io::Result<Bytes> {
        let Some(source) = self.source.as_mut() else {
            return Ok(Bytes::new());
        };

        let mut buf = vec![0u8; self.window];
        let mut filled = 0;
        while filled < buf.len() {
            let n = source.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(Bytes::from(buf))
    }
}

//! Test fixtures: deterministic video bytes and instrumented byte sources.

use crate::domain::VideoAsset;
use crate::ports::source::{ByteSource, ByteSourceOpener};
use async_trait::async_trait;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};

/// Deterministic, non-repeating-per-window content of `len` bytes.
pub fn fixture_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Set once the owning source has been dropped.
#[derive(Clone, Default)]
pub struct ReleaseFlag(Arc<AtomicBool>);

impl ReleaseFlag {
    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory source that records when it is dropped.
pub struct TrackedSource {
    inner: Cursor<Vec<u8>>,
    flag: ReleaseFlag,
}

impl TrackedSource {
    pub fn new(data: Vec<u8>) -> (Self, ReleaseFlag) {
        let flag = ReleaseFlag::default();
        (
            Self {
                inner: Cursor::new(data),
                flag: flag.clone(),
            },
            flag,
        )
    }
}

impl AsyncRead for TrackedSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.flag.0.store(true, Ordering::SeqCst);
    }
}

/// Hands out at most `per_read` bytes per read call.
pub struct DribbleReader {
    data: Vec<u8>,
    pos: usize,
    per_read: usize,
}

impl DribbleReader {
    pub fn new(data: Vec<u8>, per_read: usize) -> Self {
        Self {
            data,
            pos: 0,
            per_read: per_read.max(1),
        }
    }
}

impl AsyncRead for DribbleReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let end = (self.pos + self.per_read)
            .min(self.data.len())
            .min(self.pos + buf.remaining());
        let start = self.pos;
        buf.put_slice(&self.data[start..end]);
        self.pos = end;
        Poll::Ready(Ok(()))
    }
}

/// Serves `data`, then fails every read instead of reporting EOF.
pub struct FailingReader {
    inner: Cursor<Vec<u8>>,
}

impl FailingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        match Pin::new(&mut self.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) if buf.filled().len() == before => Poll::Ready(Err(
                io::Error::new(io::ErrorKind::Other, "disk went away"),
            )),
            other => other,
        }
    }
}

/// Opens `FailingReader`s over a fixed prefix, whatever the asset.
pub struct FailingOpener {
    pub prefix: Vec<u8>,
}

#[async_trait]
impl ByteSourceOpener for FailingOpener {
    async fn open(&self, _asset: &VideoAsset) -> io::Result<ByteSource> {
        Ok(Box::new(FailingReader::new(self.prefix.clone())))
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    open_now: AtomicUsize,
    bytes_read: AtomicUsize,
}

/// Live view of the handles a `CountingOpener` has handed out.
#[derive(Clone, Default)]
pub struct OpenStats(Arc<Counters>);

impl OpenStats {
    pub fn opened(&self) -> usize {
        self.0.opened.load(Ordering::SeqCst)
    }

    pub fn open_now(&self) -> usize {
        self.0.open_now.load(Ordering::SeqCst)
    }

    pub fn bytes_read(&self) -> usize {
        self.0.bytes_read.load(Ordering::SeqCst)
    }

    /// Poll until no handle is open, up to `within`.
    pub async fn wait_closed(&self, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.open_now() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.open_now() == 0
    }
}

/// Wraps another opener and counts open handles and bytes read.
pub struct CountingOpener<O> {
    inner: O,
    stats: OpenStats,
}

impl<O> CountingOpener<O> {
    pub fn new(inner: O) -> (Self, OpenStats) {
        let stats = OpenStats::default();
        (
            Self {
                inner,
                stats: stats.clone(),
            },
            stats,
        )
    }
}

#[async_trait]
impl<O: ByteSourceOpener> ByteSourceOpener for CountingOpener<O> {
    async fn open(&self, asset: &VideoAsset) -> io::Result<ByteSource> {
        let inner = self.inner.open(asset).await?;
        self.stats.0.opened.fetch_add(1, Ordering::SeqCst);
        self.stats.0.open_now.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedSource {
            inner,
            stats: self.stats.clone(),
        }))
    }
}

struct CountedSource {
    inner: ByteSource,
    stats: OpenStats,
}

impl AsyncRead for CountedSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        let read = buf.filled().len() - before;
        self.stats.0.bytes_read.fetch_add(read, Ordering::SeqCst);
        poll
    }
}

impl Drop for CountedSource {
    fn drop(&mut self) {
        self.stats.0.open_now.fetch_sub(1, Ordering::SeqCst);
    }
}

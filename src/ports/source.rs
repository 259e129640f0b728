use crate::domain::VideoAsset;
use async_trait::async_trait;
use std::io;
use tokio::io::AsyncRead;

/// An open, exclusively owned byte source. Dropping it releases the handle.
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait ByteSourceOpener: Send + Sync {
    /// Open the asset's content for sequential reading.
    async fn open(&self, asset: &VideoAsset) -> io::Result<ByteSource>;
}

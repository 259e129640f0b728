use crate::domain::VideoAsset;
use crate::ports::source::{ByteSource, ByteSourceOpener};
use async_trait::async_trait;
use std::io;

/// Opens assets straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl FsOpener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ByteSourceOpener for FsOpener {
    async fn open(&self, asset: &VideoAsset) -> io::Result<ByteSource> {
        let file = tokio::fs::File::open(&asset.path).await?;
        Ok(Box::new(file))
    }
}

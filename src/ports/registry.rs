use crate::domain::VideoAsset;

/// Resolves a video identifier to a registered asset.
///
/// Lookups are pure reads; implementations must be safe to share across
/// concurrent sessions without locking.
#[cfg_attr(test, mockall::automock)]
pub trait AssetRegistry: Send + Sync {
    /// Returns `None` when the id is unknown.
    fn lookup(&self, video_id: &str) -> Option<VideoAsset>;
}

use crate::domain::VideoAsset;
use crate::ports::registry::AssetRegistry;
use std::collections::HashMap;
use std::path::Path;

/// Assets every deployment ships with, as `(id, file name)` under the video
/// directory.
pub const BUILTIN_ASSETS: &[(&str, &str)] = &[("sample", "sample.mp4")];

/// Fixed asset table, populated once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    assets: HashMap<String, VideoAsset>,
}

impl StaticRegistry {
    pub fn new(assets: impl IntoIterator<Item = VideoAsset>) -> Self {
        Self {
            assets: assets
                .into_iter()
                .map(|asset| (asset.id.clone(), asset))
                .collect(),
        }
    }

    /// Build the table from `(id, file name)` pairs rooted at `video_dir`.
    pub fn from_entries<'a>(
        video_dir: &Path,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self::new(
            entries
                .into_iter()
                .map(|(id, file)| VideoAsset::from_path(id, video_dir.join(file))),
        )
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetRegistry for StaticRegistry {
    fn lookup(&self, video_id: &str) -> Option<VideoAsset> {
        self.assets.get(video_id).cloned()
    }
}

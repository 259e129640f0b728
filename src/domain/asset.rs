use std::path::{Path, PathBuf};

/// A registered video: where its bytes live and how to label them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub id: String,
    pub path: PathBuf,
    pub mime_type: String,
}

impl VideoAsset {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Build an asset whose MIME type is guessed from the file extension.
    pub fn from_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = guess_mime_type(&path);
        Self::new(id, path, mime_type)
    }
}

/// Basic mime detection, falling back to `application/octet-stream`.
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

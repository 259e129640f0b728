//! Domain layer - Plain data shared by every layer.

pub mod asset;
pub mod chunk;
pub mod error;

pub use asset::VideoAsset;
pub use chunk::{Chunk, VideoRequest, DEFAULT_QUALITY};
pub use error::StreamError;

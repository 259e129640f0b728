//! Application layer - The streaming core, generic over its ports.

pub mod chunk_source;
pub mod session;

pub use chunk_source::{ChunkProducer, DEFAULT_CHUNK_SIZE};
pub use session::{SessionHandle, SessionState, VideoStreamer};

use bytes::Bytes;

/// Quality used when a caller does not ask for one.
pub const DEFAULT_QUALITY: i32 = 2;

/// A request to stream one asset.
///
/// `quality` is an opaque tag: it is carried through every layer and logged,
/// but a single rendition is served regardless of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub video_id: String,
    pub quality: i32,
}

impl VideoRequest {
    pub fn new(video_id: impl Into<String>, quality: i32) -> Self {
        Self {
            video_id: video_id.into(),
            quality,
        }
    }
}

/// One framed unit of a video byte stream.
///
/// Within a stream, sequence numbers run contiguously from 0 and exactly one
/// chunk (the last one, with empty `data`) has `is_last` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sequence_number: u64,
    pub data: Bytes,
    pub is_last: bool,
    pub mime_type: String,
}

impl Chunk {
    pub fn data(sequence_number: u64, data: Bytes, mime_type: &str) -> Self {
        Self {
            sequence_number,
            data,
            is_last: false,
            mime_type: mime_type.to_string(),
        }
    }

    pub fn terminal(sequence_number: u64, mime_type: &str) -> Self {
        Self {
            sequence_number,
            data: Bytes::new(),
            is_last: true,
            mime_type: mime_type.to_string(),
        }
    }
}

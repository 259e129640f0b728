//! Configuration for the video server and the HTTP gateway.

use crate::adapters::local::{StaticRegistry, BUILTIN_ASSETS};
use crate::application::DEFAULT_CHUNK_SIZE;
use crate::domain::DEFAULT_QUALITY;
use std::env;
use std::path::PathBuf;

/// Configuration for the gRPC video server.
#[derive(Clone, Debug)]
pub struct StreamServerConfig {
    /// gRPC bind address
    pub grpc_addr: String,
    /// Directory the asset table's file names are relative to
    pub video_dir: PathBuf,
    /// Read window in bytes
    pub chunk_size: usize,
    /// Chunks allowed to queue per session before reads pause
    pub stream_buffer: usize,
    /// `(id, file name)` pairs making up the asset table
    pub assets: Vec<(String, String)>,
}

impl StreamServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            grpc_addr: env::var("GRPC_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:50051")),
            video_dir: PathBuf::from(
                env::var("VIDEO_DIR").unwrap_or_else(|_| String::from("./videos")),
            ),
            chunk_size: env::var("CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            stream_buffer: env::var("STREAM_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            assets: env::var("VIDEO_ASSETS")
                .ok()
                .map(|v| parse_assets(&v))
                .filter(|assets| !assets.is_empty())
                .unwrap_or_else(builtin_assets),
        }
    }

    pub fn registry(&self) -> StaticRegistry {
        StaticRegistry::from_entries(
            &self.video_dir,
            self.assets.iter().map(|(id, file)| (id.as_str(), file.as_str())),
        )
    }
}

/// Configuration for the HTTP gateway.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// HTTP bind address
    pub http_addr: String,
    /// Where the gRPC video server lives
    pub grpc_endpoint: String,
    /// Quality used when a request does not carry one
    pub default_quality: i32,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            http_addr: env::var("HTTP_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:3000")),
            grpc_endpoint: env::var("GRPC_ENDPOINT")
                .unwrap_or_else(|_| String::from("http://127.0.0.1:50051")),
            default_quality: env::var("DEFAULT_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_QUALITY),
        }
    }
}

fn builtin_assets() -> Vec<(String, String)> {
    BUILTIN_ASSETS
        .iter()
        .map(|(id, file)| (id.to_string(), file.to_string()))
        .collect()
}

/// Parse `id=file,id2=file2`. Malformed entries are skipped.
pub fn parse_assets(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (id, file) = entry.split_once('=')?;
            let (id, file) = (id.trim(), file.trim());
            if id.is_empty() || file.is_empty() {
                tracing::warn!(entry, "ignoring malformed VIDEO_ASSETS entry");
                return None;
            }
            Some((id.to_string(), file.to_string()))
        })
        .collect()
}

//! Chunkcast - Chunked video delivery over gRPC, relayed to HTTP
//!
//! Hexagonal Architecture:
//! - domain/: Plain data (assets, chunks, errors)
//! - ports/: Trait definitions (asset registry, byte sources, transport)
//! - adapters/: Concrete implementations (local files, gRPC, HTTP gateway)
//! - application/: Chunk source and stream sessions
//! - config: Environment configuration
//!
//! Data flows one way: HTTP request -> gateway -> gRPC call -> chunk source
//! -> file bytes -> gRPC messages -> gateway -> HTTP response body.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod shutdown;
pub mod telemetry;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use adapters::grpc::GrpcTransport;
pub use adapters::http::GatewayState;
pub use adapters::local::{FsOpener, StaticRegistry};
pub use application::VideoStreamer;
pub use config::{GatewayConfig, StreamServerConfig};

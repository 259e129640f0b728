//! Video Server Binary - Streaming Transport Endpoint over gRPC
//!
//! Serves `video.VideoService/StreamVideo` from the static asset table.

use chunkcast::adapters::grpc;
use chunkcast::shutdown::ShutdownCoordinator;
use chunkcast::{FsOpener, StreamServerConfig, VideoStreamer};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = StreamServerConfig::from_env();

    chunkcast::telemetry::init();

    let registry = config.registry();
    info!(
        assets = registry.len(),
        video_dir = ?config.video_dir,
        chunk_size = config.chunk_size,
        "asset table loaded"
    );

    let shutdown = ShutdownCoordinator::new();
    let streamer = Arc::new(
        VideoStreamer::new(registry, FsOpener::new())
            .with_chunk_size(config.chunk_size)
            .with_in_flight(config.stream_buffer)
            .with_shutdown(shutdown.token()),
    );

    let listener = match tokio::net::TcpListener::bind(&config.grpc_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.grpc_addr, error = %e, "failed to bind gRPC listener");
            return ExitCode::FAILURE;
        }
    };

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal_and_shutdown().await });

    if let Err(e) = grpc::serve(listener, streamer, shutdown.token()).await {
        error!(error = %e, "gRPC server failed");
        return ExitCode::FAILURE;
    }
    info!("video server stopped");
    ExitCode::SUCCESS
}

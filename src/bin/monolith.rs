//! Monolith Binary - Video server and gateway in one process
//!
//! This is the main entry point for local development. It wires up:
//! - Local adapters (static asset table, filesystem)
//! - gRPC video service
//! - HTTP gateway calling the gRPC service over loopback

use chunkcast::adapters::{grpc, http};
use chunkcast::shutdown::ShutdownCoordinator;
use chunkcast::{
    FsOpener, GatewayConfig, GatewayState, GrpcTransport, StreamServerConfig, VideoStreamer,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let server_config = StreamServerConfig::from_env();
    let gateway_config = GatewayConfig::from_env();

    chunkcast::telemetry::init();

    let shutdown = ShutdownCoordinator::new();

    // 1. Adapters (Local implementations)
    let registry = server_config.registry();
    info!(assets = registry.len(), video_dir = ?server_config.video_dir, "asset table loaded");

    // 2. Streaming core
    let streamer = Arc::new(
        VideoStreamer::new(registry, FsOpener::new())
            .with_chunk_size(server_config.chunk_size)
            .with_in_flight(server_config.stream_buffer)
            .with_shutdown(shutdown.token()),
    );

    // 3. Listeners
    let (grpc_listener, http_listener) = match tokio::try_join!(
        TcpListener::bind(&server_config.grpc_addr),
        TcpListener::bind(&gateway_config.http_addr)
    ) {
        Ok(listeners) => listeners,
        Err(e) => {
            error!(error = %e, "failed to bind listeners");
            return ExitCode::FAILURE;
        }
    };
    let grpc_endpoint = match grpc_listener.local_addr() {
        Ok(addr) => format!("http://{}", addr),
        Err(e) => {
            error!(error = %e, "gRPC listener has no local address");
            return ExitCode::FAILURE;
        }
    };

    // 4. Gateway -> gRPC transport over loopback
    let transport = match GrpcTransport::connect_lazy(grpc_endpoint) {
        Ok(transport) => transport,
        Err(e) => {
            error!(error = %e, "failed to build gRPC transport");
            return ExitCode::FAILURE;
        }
    };
    let state = GatewayState::new(Arc::new(transport))
        .with_default_quality(gateway_config.default_quality);

    // 5. Start servers
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal_and_shutdown().await });

    let grpc_server = grpc::serve(grpc_listener, streamer, shutdown.token());
    let http_server = http::serve(http_listener, state, shutdown.token());
    let (grpc_result, http_result) = tokio::join!(grpc_server, http_server);

    let mut code = ExitCode::SUCCESS;
    if let Err(e) = grpc_result {
        error!(error = %e, "gRPC server failed");
        code = ExitCode::FAILURE;
    }
    if let Err(e) = http_result {
        error!(error = %e, "HTTP gateway failed");
        code = ExitCode::FAILURE;
    }
    info!("monolith stopped");
    code
}

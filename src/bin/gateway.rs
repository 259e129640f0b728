//! Gateway Binary - HTTP front for a remote video server
//!
//! `GET /video?videoId=<id>&quality=<int>` relays the gRPC stream as a
//! chunked HTTP body.

use chunkcast::adapters::http;
use chunkcast::shutdown::ShutdownCoordinator;
use chunkcast::{GatewayConfig, GatewayState, GrpcTransport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = GatewayConfig::from_env();

    chunkcast::telemetry::init();

    let transport = match GrpcTransport::connect_lazy(config.grpc_endpoint.clone()) {
        Ok(transport) => transport,
        Err(e) => {
            error!(endpoint = %config.grpc_endpoint, error = %e, "invalid gRPC endpoint");
            return ExitCode::FAILURE;
        }
    };
    let state =
        GatewayState::new(Arc::new(transport)).with_default_quality(config.default_quality);

    let listener = match tokio::net::TcpListener::bind(&config.http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.http_addr, error = %e, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = ShutdownCoordinator::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal_and_shutdown().await });

    info!(endpoint = %config.grpc_endpoint, "relaying to video server");
    if let Err(e) = http::serve(listener, state, shutdown.token()).await {
        error!(error = %e, "HTTP gateway failed");
        return ExitCode::FAILURE;
    }
    info!("gateway stopped");
    ExitCode::SUCCESS
}

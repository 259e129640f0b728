//! Adapters - Concrete implementations of ports.

pub mod grpc;
pub mod http;
pub mod local;

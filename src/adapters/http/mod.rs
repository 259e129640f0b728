//! HTTP gateway: rehydrates a transport stream into a chunked HTTP body.

mod error;
pub mod video;

pub use error::ApiError;
pub use video::{router, serve, GatewayState};

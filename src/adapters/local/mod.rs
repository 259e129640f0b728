//! Local adapters: static asset table and filesystem byte sources.

pub mod fs;
pub mod registry;

pub use fs::FsOpener;
pub use registry::{StaticRegistry, BUILTIN_ASSETS};

//! Ports - Trait seams between the streaming core and its collaborators.

pub mod registry;
pub mod source;
pub mod transport;

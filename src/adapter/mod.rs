//! Adapters: implementations of the ports.
//!
//! - [`inbound`]: driving side (the `gpmarket` CLI)
//! - [`outbound`]: driven side (journals and notifiers)

pub mod inbound;
pub mod outbound;

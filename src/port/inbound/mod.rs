//! Inbound (driving) ports consumed by inbound adapters.
//!
//! Inbound ports expose application capabilities to external drivers such as
//! the command-line interface or an HTTP layer.
//!
//! # Modules
//!
//! - [`trading`]: Trade submission, resolution and read-only queries

pub mod trading;

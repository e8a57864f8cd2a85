//! Outbound adapters (driven side).

pub mod memory;
pub mod notifier;
pub mod sqlite;

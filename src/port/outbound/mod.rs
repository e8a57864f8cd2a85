//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as durable
//! storage, time, and event delivery.

pub mod clock;
pub mod journal;
pub mod notifier;

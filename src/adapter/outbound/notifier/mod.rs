//! Notification adapters.
//!
//! Implements the `port::outbound::notifier::Notifier` trait for async
//! consumers. [`LogNotifier`](crate::port::outbound::notifier::LogNotifier)
//! covers plain logging.

pub mod channel;

//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] : [`ManualClock`](clock::ManualClock) for deterministic close times.
//! - [`journal`] : [`FailingJournal`](journal::FailingJournal) for commit-point tests.
//! - [`notifier`] : [`RecordingNotifier`](notifier::RecordingNotifier) capturing events.
//! - [`market`] : Builders for market drafts.
//! - [`harness`] : An engine wired with all of the above.

pub mod clock;
pub mod harness;
pub mod journal;
pub mod market;
pub mod notifier;

//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (journals, clocks, notification consumers, API layers).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │   CLI   │            │   Journal   │              │ Notifier  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`TradingService`](inbound::trading::TradingService) - Inbound trading boundary
//! - [`Journal`](outbound::journal::Journal) - Durable commit log
//! - [`Clock`](outbound::clock::Clock) - Time source for auto-close
//! - [`Notifier`](outbound::notifier::Notifier) - Event notifications

pub mod inbound;
pub mod outbound;


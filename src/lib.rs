//! gpmarket - LMSR prediction markets with a GP wallet ledger.
//!
//! A trading engine for gamified prediction markets: an automated market
//! maker prices every outcome with the Logarithmic Market Scoring Rule, a
//! per-user ledger tracks the virtual currency (GP), and a settlement
//! engine pays out winners or refunds voided markets.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Pure types and pricing: markets, outcomes, ledger entries,
//!   the LMSR cost function and the trade policy
//! - [`port`] - Traits at the boundaries: the trading service, the journal,
//!   the clock and notifiers
//! - [`application`] - The engine: market locks, wallets, positions,
//!   settlement, replay and audit
//! - [`adapter`] - Journal stores (memory, SQLite), notifiers and the CLI
//! - [`infrastructure`] - Configuration loading and bootstrap
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use gpmarket::adapter::outbound::memory::MemoryJournal;
//! use gpmarket::application::engine::Engine;
//! use gpmarket::domain::id::{OutcomeId, UserId};
//! use gpmarket::domain::market::NewMarket;
//! use gpmarket::domain::trade::TradeRequest;
//! use rust_decimal::Decimal;
//!
//! let engine = Engine::builder(Arc::new(MemoryJournal::new())).build();
//! let market = engine.create_market(NewMarket {
//!     slug: "rain-tomorrow".into(),
//!     title: "Will it rain tomorrow?".into(),
//!     description: String::new(),
//!     category: "weather".into(),
//!     liquidity: Decimal::from(100),
//!     close_time: Utc::now() + Duration::days(1),
//!     outcomes: vec![
//!         (OutcomeId::from("yes"), "Yes".into()),
//!         (OutcomeId::from("no"), "No".into()),
//!     ],
//! })?;
//!
//! let alice = UserId::from("alice");
//! engine.adjust(&alice, 1000, "welcome bonus")?;
//! let receipt = engine.execute_trade(&TradeRequest::buy(
//!     "alice",
//!     market.id.clone(),
//!     "yes",
//!     Decimal::from(10),
//! ))?;
//! assert_eq!(receipt.new_balance_gp, 995);
//! # Ok::<(), gpmarket::error::Error>(())
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

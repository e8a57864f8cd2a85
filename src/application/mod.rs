//! Application services (use cases).
//!
//! These services own the mutable state of the system and orchestrate the
//! pure domain logic behind the port traits.
//!
//! - [`engine`]: The trading engine and its builder
//! - [`wallet`]: Wallet accounts and the ledger id sequence
//! - [`position`]: Per-market position books
//! - [`settlement`]: Payout and refund computation

pub mod engine;
pub(crate) mod market;
pub mod position;
pub mod settlement;
pub mod wallet;

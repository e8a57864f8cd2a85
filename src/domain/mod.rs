//! Market domain logic.
//!
//! Pure types and functions: no locks, no I/O. The application layer owns
//! all mutable state and calls into these types while holding the relevant
//! market lock.

pub mod error;
pub mod id;
pub mod ledger;
pub mod market;
pub mod policy;
pub mod position;
pub mod pricing;
pub mod settlement;
pub mod trade;


//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed journal using Diesel ORM.

pub mod database;
pub mod journal;

//! Command-line interface for the gpmarket engine.

pub mod audit;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod market;
pub mod output;
pub mod paths;
pub mod portfolio;
pub mod session;
pub mod trade;
pub mod wallet;

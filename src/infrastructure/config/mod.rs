//! Infrastructure configuration modules.

pub mod ledger;
pub mod logging;
pub mod market;
pub mod policy;
pub mod settings;
pub mod storage;

//! Wallet ledger configuration.

use serde::{Deserialize, Serialize};

/// Ledger verification and paging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Re-sum the affected ledgers after every commit (default: true).
    #[serde(default = "default_verify_on_commit")]
    pub verify_on_commit: bool,
    /// Default number of entries per history page (default: 50, max: 500).
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
}

const fn default_verify_on_commit() -> bool {
    true
}

const fn default_history_page_size() -> usize {
    50
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verify_on_commit: default_verify_on_commit(),
            history_page_size: default_history_page_size(),
        }
    }
}

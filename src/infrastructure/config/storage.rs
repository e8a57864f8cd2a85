//! Journal storage configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Journal backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalBackend {
    /// Ephemeral, lost at process exit.
    Memory,
    /// SQLite file at `storage.database`.
    #[default]
    Sqlite,
}

impl fmt::Display for JournalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Journal backend.
    #[serde(default)]
    pub journal: JournalBackend,

    /// Path to SQLite database file.
    ///
    /// Defaults to "gpmarket.db" in the current directory. Overridden by
    /// `GPMARKET_DATABASE`.
    #[serde(default = "default_database_path")]
    pub database: String,
}

fn default_database_path() -> String {
    "gpmarket.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            journal: JournalBackend::default(),
            database: default_database_path(),
        }
    }
}

//! Path utilities for gpmarket.
//!
//! All data lives under `~/.gpmarket/`:
//! - `~/.gpmarket/config.toml` - main configuration
//! - `~/.gpmarket/gpmarket.db` - SQLite journal

use std::path::PathBuf;

/// Returns the gpmarket home directory (`~/.gpmarket/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gpmarket")
}

/// Returns the default config file path (`~/.gpmarket/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default journal database path (`~/.gpmarket/gpmarket.db`).
pub fn default_database() -> PathBuf {
    home_dir().join("gpmarket.db")
}

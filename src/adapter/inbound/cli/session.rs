//! Config loading and engine restore shared by command handlers.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::paths;
use crate::application::engine::Engine;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::{Config, DATABASE_ENV};
use crate::infrastructure::config::storage::JournalBackend;

/// Load the config file, or the defaults with the journal under
/// `~/.gpmarket/` when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    if !path.exists() && std::env::var_os(DATABASE_ENV).is_none() {
        config.storage.database = paths::default_database().to_string_lossy().into_owned();
    }
    Ok(config)
}

/// Restore the engine from the configured journal.
pub fn open_engine(config: &Config) -> Result<Engine> {
    if config.storage.journal == JournalBackend::Sqlite {
        if let Some(parent) = Path::new(&config.storage.database).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }
    bootstrap::restore_engine(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_engine_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database = dir
            .path()
            .join("nested")
            .join("gpmarket.db")
            .to_string_lossy()
            .into_owned();

        open_engine(&config).unwrap();
        assert!(dir.path().join("nested").join("gpmarket.db").exists());
    }

    #[test]
    fn load_config_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\njournal = \"memory\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.storage.journal, JournalBackend::Memory);
    }
}

//! Infrastructure bootstrap helpers for runtime wiring.
//!
//! The composition root: turns a [`Config`] into a journal, a trade policy
//! and a restored [`Engine`].

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::memory::MemoryJournal;
use crate::adapter::outbound::sqlite::journal::SqliteJournal;
use crate::application::engine::{Engine, EngineBuilder};
use crate::domain::policy::{StandardPolicy, TradePolicy};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::storage::JournalBackend;
use crate::port::outbound::journal::Journal;
use crate::port::outbound::notifier::{LogNotifier, Notifier};

/// Open the configured journal backend.
///
/// # Errors
/// Returns an error if the SQLite database cannot be opened or migrated.
pub fn build_journal(config: &Config) -> Result<Arc<dyn Journal>> {
    match config.storage.journal {
        JournalBackend::Memory => Ok(Arc::new(MemoryJournal::new())),
        JournalBackend::Sqlite => {
            let journal = SqliteJournal::open(&config.storage.database)?;
            info!(database = %config.storage.database, "Opened SQLite journal");
            Ok(Arc::new(journal))
        }
    }
}

/// Build the trade policy from the `[policy]` section.
#[must_use]
pub fn build_policy(config: &Config) -> Arc<dyn TradePolicy> {
    Arc::new(StandardPolicy::from(config.policy))
}

/// Wire an engine builder from configuration, logging every event.
#[must_use]
pub fn engine_builder(config: &Config, journal: Arc<dyn Journal>) -> EngineBuilder {
    Engine::builder(journal)
        .policy(build_policy(config))
        .settings(config.engine_settings())
        .notifier(Box::new(LogNotifier))
}

/// Open the journal and restore the engine from it.
///
/// # Errors
/// Returns an error if the journal cannot be opened or replay fails.
pub fn restore_engine(config: &Config) -> Result<Engine> {
    restore_engine_with(config, Vec::new())
}

/// Like [`restore_engine`], registering additional notifiers.
///
/// # Errors
/// Returns an error if the journal cannot be opened or replay fails.
pub fn restore_engine_with(config: &Config, notifiers: Vec<Box<dyn Notifier>>) -> Result<Engine> {
    let journal = build_journal(config)?;
    let builder = notifiers
        .into_iter()
        .fold(engine_builder(config, journal), EngineBuilder::notifier);
    builder.restore()
}

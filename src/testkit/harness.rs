//! An engine wired with test doubles.

use std::sync::Arc;

use chrono::Duration;

use super::clock::ManualClock;
use super::journal::FailingJournal;
use super::market::MarketDraft;
use super::notifier::RecordingNotifier;
use crate::application::engine::{Engine, EngineBuilder};
use crate::domain::id::{MarketId, UserId};
use crate::domain::market::NewMarket;
use crate::port::outbound::clock::Clock;

/// Engine over a [`FailingJournal`], a [`ManualClock`] and a
/// [`RecordingNotifier`].
pub struct Harness {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub journal: Arc<FailingJournal>,
    pub events: RecordingNotifier,
}

impl Harness {
    /// Fresh engine with default settings.
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    /// Fresh engine with customised builder settings.
    pub fn with(configure: impl FnOnce(EngineBuilder) -> EngineBuilder) -> Self {
        let clock = Arc::new(ManualClock::default());
        let journal = Arc::new(FailingJournal::new());
        let events = RecordingNotifier::new();
        let builder = Engine::builder(journal.clone())
            .clock(clock.clone())
            .notifier(Box::new(events.clone()));
        Self {
            engine: configure(builder).build(),
            clock,
            journal,
            events,
        }
    }

    /// A YES/NO draft opening now on the harness clock.
    pub fn draft(&self, slug: &str) -> MarketDraft {
        MarketDraft::binary(slug, self.clock.now())
    }

    /// Create a market and return its id.
    pub fn create(&self, draft: NewMarket) -> MarketId {
        self.engine
            .create_market(draft)
            .expect("market creation should succeed")
            .id
            .clone()
    }

    /// Create a YES/NO market and return its id.
    pub fn binary_market(&self, slug: &str) -> MarketId {
        self.create(self.draft(slug).build())
    }

    /// Grant `gp` to `user` and return the id.
    pub fn funded_user(&self, user: &str, gp: i64) -> UserId {
        let user_id = UserId::from(user);
        self.engine
            .adjust(&user_id, gp, "test grant")
            .expect("grant should succeed");
        user_id
    }

    /// Move the clock past a market's close time.
    pub fn pass_close_time(&self, market_id: &MarketId) {
        let close_time = self
            .engine
            .snapshot(market_id)
            .expect("market exists")
            .close_time;
        self.clock.set(close_time + Duration::seconds(1));
    }

    /// Rebuild a second engine from this harness's journal.
    pub fn restore(&self) -> Engine {
        Engine::builder(self.journal.clone())
            .clock(self.clock.clone())
            .restore()
            .expect("journal should replay")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

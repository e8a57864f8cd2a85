//! In-memory journal.
//!
//! Records are kept in their serialized JSON form so replay exercises the
//! same encoding as the durable adapters.

use parking_lot::RwLock;

use crate::error::Result;
use crate::port::outbound::journal::{Journal, JournalRecord};

/// Journal that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: RwLock<Vec<String>>,
}

impl MemoryJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing was committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Journal for MemoryJournal {
    fn append(&self, record: &JournalRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        self.records.write().push(payload);
        Ok(())
    }

    fn replay(&self) -> Result<Vec<JournalRecord>> {
        self.records
            .read()
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::MarketId;

    #[test]
    fn replays_in_append_order() {
        let journal = MemoryJournal::new();
        assert!(journal.is_empty());
        journal
            .append(&JournalRecord::MarketHalted {
                market_id: MarketId::from("m1"),
                reason: "ledger mismatch".into(),
            })
            .unwrap();
        journal
            .append(&JournalRecord::HaltCleared {
                market_id: MarketId::from("m1"),
            })
            .unwrap();

        let records = journal.replay().unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(records[0].kind(), "market_halted");
        assert_eq!(records[1].kind(), "halt_cleared");
    }
}

//! Journal with injectable append failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::adapter::outbound::memory::MemoryJournal;
use crate::error::{Error, Result};
use crate::port::outbound::journal::{Journal, JournalRecord};

/// In-memory journal whose appends can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FailingJournal {
    inner: MemoryJournal,
    failing: AtomicBool,
    rejected: AtomicUsize,
}

impl FailingJournal {
    /// Create a journal that accepts appends until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following append fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of appends refused so far.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was committed yet.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Journal for FailingJournal {
    fn append(&self, record: &JournalRecord) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(Error::Database(format!(
                "injected failure appending {}",
                record.kind()
            )));
        }
        self.inner.append(record)
    }

    fn replay(&self) -> Result<Vec<JournalRecord>> {
        self.inner.replay()
    }
}

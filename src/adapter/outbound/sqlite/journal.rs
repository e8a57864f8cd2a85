//! SQLite journal implementation.
//!
//! One row per record. The record itself is stored as JSON in `payload`;
//! `kind` and `market_id` are copied out so operators can query the table
//! directly. Replay order is the autoincrement `seq`.

use chrono::Utc;
use diesel::prelude::*;

use super::database::connection::{create_pool, run_migrations, DbPool};
use super::database::model::{JournalRow, NewJournalRow};
use super::database::schema::journal_records;
use crate::domain::id::MarketId;
use crate::error::{Error, Result};
use crate::port::outbound::journal::{Journal, JournalRecord};

/// SQLite-backed journal.
pub struct SqliteJournal {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteJournal {
    /// Create a journal over an already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &str) -> Result<Self> {
        let pool = create_pool(path)?;
        run_migrations(&pool)?;
        Ok(Self::new(pool))
    }

    /// Number of stored records.
    ///
    /// # Errors
    /// Returns an error if the count query fails.
    pub fn len(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        journal_records::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Returns true if no record was stored yet.
    ///
    /// # Errors
    /// Returns an error if the count query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

impl Journal for SqliteJournal {
    fn append(&self, record: &JournalRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let row = NewJournalRow {
            kind: record.kind(),
            market_id: record.market_id().map(MarketId::as_str),
            payload: &payload,
            recorded_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self.conn()?;
        diesel::insert_into(journal_records::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    fn replay(&self) -> Result<Vec<JournalRecord>> {
        let mut conn = self.conn()?;
        let rows: Vec<JournalRow> = journal_records::table
            .order(journal_records::seq.asc())
            .select(JournalRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| serde_json::from_str(&row.payload).map_err(Into::into))
            .collect()
    }
}

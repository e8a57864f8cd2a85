//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::journal_records;

/// Journal row (insertable). `seq` is assigned by SQLite.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = journal_records)]
pub struct NewJournalRow<'a> {
    pub kind: &'a str,
    pub market_id: Option<&'a str>,
    pub payload: &'a str,
    pub recorded_at: String,
}

/// Journal row (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = journal_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JournalRow {
    pub seq: i64,
    pub kind: String,
    pub market_id: Option<String>,
    pub payload: String,
    pub recorded_at: String,
}

//! SQLite-backed persistence for Engram.
//!
//! One embedded store behind a connection pool: schema management (with a
//! legacy-table migration), the observation write path (topic upserts and
//! window deduplication), FTS5 search, timelines, and the snapshot
//! export/import used by sync.

mod migrations;
mod storage;
#[cfg(test)]
mod tests;

pub use storage::Storage;

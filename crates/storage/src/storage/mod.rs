//! `Storage` — the shared handle every front-end talks to.
//!
//! Wraps an r2d2 pool of SQLite connections. Each pooled connection is
//! initialized with the WAL/busy-timeout/foreign-key pragmas; the busy
//! timeout is the only inter-call synchronization the engine relies on.

mod capture;
mod observations;
mod prompts;
mod search;
mod sessions;
mod snapshot;
mod stats;
mod timeline;

use engram_core::{env_parse_with_default, Config, EngramError, Observation, Prompt, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::migrations;

pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Embedded memory store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<SqliteConnectionManager>,
    cfg: Config,
}

/// Column list shared by every observation SELECT, in `map_observation`
/// order.
pub(crate) const OBSERVATION_COLUMNS: &str = "id, session_id, type, title, content, tool_name, \
     project, scope, topic_key, revision_count, duplicate_count, last_seen_at, created_at, \
     updated_at, deleted_at";

fn init_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
}

impl Storage {
    /// Opens (creating if needed) the database under `cfg.data_dir` and
    /// brings the schema up to date.
    pub fn open(cfg: Config) -> Result<Self> {
        std::fs::create_dir_all(&cfg.data_dir)
            .map_err(|e| EngramError::storage("create data dir", e))?;

        let manager = SqliteConnectionManager::file(cfg.db_path()).with_init(init_connection);
        let pool_size: u32 = env_parse_with_default("ENGRAM_DB_POOL_SIZE", 8);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| EngramError::storage("open database", e))?;

        {
            let conn = pool.get().map_err(|e| EngramError::storage("open database", e))?;
            migrations::run_migrations(&conn).map_err(|e| EngramError::storage("migration", e))?;
        }

        tracing::debug!(db = %cfg.db_path().display(), pool_size, "store opened");
        Ok(Self { pool, cfg })
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub(crate) fn conn(&self) -> Result<PooledConn> {
        self.pool.get().map_err(|e| EngramError::storage("connection pool", e))
    }
}

/// Wraps a rusqlite failure with the operation it happened in.
pub(crate) fn db_err(op: &'static str) -> impl Fn(rusqlite::Error) -> EngramError {
    move |e| EngramError::storage(op, e)
}

/// Empty strings are stored as NULL so that `ifnull(col, '')` comparisons
/// and JSON omission behave the same across write paths.
pub(crate) fn none_if_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Maps a row selected with [`OBSERVATION_COLUMNS`].
pub(crate) fn map_observation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get(0)?,
        session_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        tool_name: row.get(5)?,
        project: row.get(6)?,
        scope: row.get(7)?,
        topic_key: row.get(8)?,
        revision_count: row.get(9)?,
        duplicate_count: row.get(10)?,
        last_seen_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        deleted_at: row.get(14)?,
    })
}

/// Maps a row of `id, session_id, content, project, created_at`.
pub(crate) fn map_prompt(row: &rusqlite::Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: row.get(0)?,
        session_id: row.get(1)?,
        content: row.get(2)?,
        project: row.get(3)?,
        created_at: row.get(4)?,
    })
}

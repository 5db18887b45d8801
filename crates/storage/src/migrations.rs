//! Schema management.
//!
//! Runs on every open: creates the base tables, FTS5 shadow tables,
//! triggers, and indexes when absent, backfills defaults for rows that
//! predate newer columns, and migrates a legacy `observations` table whose
//! `id` column was never declared a primary key. Everything here is
//! idempotent; the legacy migration runs in a single transaction so a
//! failure leaves the database untouched.

use rusqlite::{Connection, OptionalExtension};

const BASE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id         TEXT PRIMARY KEY,
        project    TEXT NOT NULL,
        directory  TEXT NOT NULL,
        started_at TEXT NOT NULL DEFAULT (datetime('now')),
        ended_at   TEXT,
        summary    TEXT
    );

    CREATE TABLE IF NOT EXISTS observations (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT    NOT NULL,
        type       TEXT    NOT NULL,
        title      TEXT    NOT NULL,
        content    TEXT    NOT NULL,
        tool_name  TEXT,
        project    TEXT,
        scope      TEXT    NOT NULL DEFAULT 'project',
        topic_key  TEXT,
        normalized_hash TEXT,
        revision_count INTEGER NOT NULL DEFAULT 1,
        duplicate_count INTEGER NOT NULL DEFAULT 1,
        last_seen_at TEXT,
        created_at TEXT    NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT    NOT NULL DEFAULT (datetime('now')),
        deleted_at TEXT,
        FOREIGN KEY (session_id) REFERENCES sessions(id)
    );

    CREATE INDEX IF NOT EXISTS idx_obs_session  ON observations(session_id);
    CREATE INDEX IF NOT EXISTS idx_obs_type     ON observations(type);
    CREATE INDEX IF NOT EXISTS idx_obs_project  ON observations(project);
    CREATE INDEX IF NOT EXISTS idx_obs_created  ON observations(created_at DESC);

    CREATE VIRTUAL TABLE IF NOT EXISTS observations_fts USING fts5(
        title,
        content,
        tool_name,
        type,
        project,
        content='observations',
        content_rowid='id'
    );

    CREATE TABLE IF NOT EXISTS user_prompts (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT    NOT NULL,
        content    TEXT    NOT NULL,
        project    TEXT,
        created_at TEXT    NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY (session_id) REFERENCES sessions(id)
    );

    CREATE INDEX IF NOT EXISTS idx_prompts_session ON user_prompts(session_id);
    CREATE INDEX IF NOT EXISTS idx_prompts_project ON user_prompts(project);
    CREATE INDEX IF NOT EXISTS idx_prompts_created ON user_prompts(created_at DESC);

    CREATE VIRTUAL TABLE IF NOT EXISTS prompts_fts USING fts5(
        content,
        project,
        content='user_prompts',
        content_rowid='id'
    );

    CREATE TABLE IF NOT EXISTS sync_chunks (
        chunk_id    TEXT PRIMARY KEY,
        imported_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
";

/// Columns added after the first release; backfilled onto old databases.
const LATER_OBSERVATION_COLUMNS: &[(&str, &str)] = &[
    ("scope", "TEXT NOT NULL DEFAULT 'project'"),
    ("topic_key", "TEXT"),
    ("normalized_hash", "TEXT"),
    ("revision_count", "INTEGER NOT NULL DEFAULT 1"),
    ("duplicate_count", "INTEGER NOT NULL DEFAULT 1"),
    ("last_seen_at", "TEXT"),
    ("updated_at", "TEXT NOT NULL DEFAULT ''"),
    ("deleted_at", "TEXT"),
];

const SUPPORT_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_obs_scope ON observations(scope);
    CREATE INDEX IF NOT EXISTS idx_obs_topic ON observations(topic_key, project, scope, updated_at DESC);
    CREATE INDEX IF NOT EXISTS idx_obs_deleted ON observations(deleted_at);
    CREATE INDEX IF NOT EXISTS idx_obs_dedupe ON observations(normalized_hash, project, scope, type, title, created_at DESC);
";

const BACKFILL_DEFAULTS: &str = "
    UPDATE observations SET scope = 'project' WHERE scope IS NULL OR scope = '';
    UPDATE observations SET topic_key = NULL WHERE topic_key = '';
    UPDATE observations SET revision_count = 1 WHERE revision_count IS NULL OR revision_count < 1;
    UPDATE observations SET duplicate_count = 1 WHERE duplicate_count IS NULL OR duplicate_count < 1;
    UPDATE observations SET updated_at = created_at WHERE updated_at IS NULL OR updated_at = '';
";

const OBSERVATION_TRIGGERS: &str = "
    CREATE TRIGGER obs_fts_insert AFTER INSERT ON observations BEGIN
        INSERT INTO observations_fts(rowid, title, content, tool_name, type, project)
        VALUES (new.id, new.title, new.content, new.tool_name, new.type, new.project);
    END;

    CREATE TRIGGER obs_fts_delete AFTER DELETE ON observations BEGIN
        INSERT INTO observations_fts(observations_fts, rowid, title, content, tool_name, type, project)
        VALUES ('delete', old.id, old.title, old.content, old.tool_name, old.type, old.project);
    END;

    CREATE TRIGGER obs_fts_update AFTER UPDATE ON observations BEGIN
        INSERT INTO observations_fts(observations_fts, rowid, title, content, tool_name, type, project)
        VALUES ('delete', old.id, old.title, old.content, old.tool_name, old.type, old.project);
        INSERT INTO observations_fts(rowid, title, content, tool_name, type, project)
        VALUES (new.id, new.title, new.content, new.tool_name, new.type, new.project);
    END;
";

const PROMPT_TRIGGERS: &str = "
    CREATE TRIGGER prompt_fts_insert AFTER INSERT ON user_prompts BEGIN
        INSERT INTO prompts_fts(rowid, content, project)
        VALUES (new.id, new.content, new.project);
    END;

    CREATE TRIGGER prompt_fts_delete AFTER DELETE ON user_prompts BEGIN
        INSERT INTO prompts_fts(prompts_fts, rowid, content, project)
        VALUES ('delete', old.id, old.content, old.project);
    END;

    CREATE TRIGGER prompt_fts_update AFTER UPDATE ON user_prompts BEGIN
        INSERT INTO prompts_fts(prompts_fts, rowid, content, project)
        VALUES ('delete', old.id, old.content, old.project);
        INSERT INTO prompts_fts(rowid, content, project)
        VALUES (new.id, new.content, new.project);
    END;
";

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(BASE_SCHEMA)?;

    for (name, definition) in LATER_OBSERVATION_COLUMNS {
        add_column_if_not_exists(conn, "observations", name, definition)?;
    }

    migrate_legacy_observations(conn)?;

    conn.execute_batch(SUPPORT_INDEXES)?;
    conn.execute_batch(BACKFILL_DEFAULTS)?;

    if !trigger_exists(conn, "obs_fts_insert")? {
        conn.execute_batch(OBSERVATION_TRIGGERS)?;
    }
    if !trigger_exists(conn, "prompt_fts_insert")? {
        conn.execute_batch(PROMPT_TRIGGERS)?;
    }

    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, rusqlite::Error> {
    let sql = format!("PRAGMA table_info({table})");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn add_column_if_not_exists(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, table, column)? {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {definition}");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

fn trigger_exists(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'trigger' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Rebuilds a legacy `observations` table whose `id` column was plain
/// `INT` (no declared primary key, so NULLs and duplicates crept in).
///
/// Each row is copied into a canonical table: the first occurrence of a
/// duplicate id family (by `rowid`) keeps its id, later occurrences are
/// inserted with NULL so AUTOINCREMENT assigns fresh ones. Empty types and
/// titles are coerced, timestamps preserved, and the FTS index is rebuilt
/// from the live rows.
fn migrate_legacy_observations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let mut has_id = false;
    let mut id_is_primary_key = false;
    {
        let mut stmt = conn.prepare("PRAGMA table_info(observations)")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == "id" {
                let pk: i64 = row.get(5)?;
                has_id = true;
                id_is_primary_key = pk == 1;
                break;
            }
        }
    }

    if !has_id || id_is_primary_key {
        return Ok(());
    }

    tracing::info!("migrating legacy observations table to declared primary key");

    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE observations_migrated (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT    NOT NULL,
            type       TEXT    NOT NULL,
            title      TEXT    NOT NULL,
            content    TEXT    NOT NULL,
            tool_name  TEXT,
            project    TEXT,
            scope      TEXT    NOT NULL DEFAULT 'project',
            topic_key  TEXT,
            normalized_hash TEXT,
            revision_count INTEGER NOT NULL DEFAULT 1,
            duplicate_count INTEGER NOT NULL DEFAULT 1,
            last_seen_at TEXT,
            created_at TEXT    NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT    NOT NULL DEFAULT (datetime('now')),
            deleted_at TEXT,
            FOREIGN KEY (session_id) REFERENCES sessions(id)
        );",
    )?;

    tx.execute_batch(
        "INSERT INTO observations_migrated (
            id, session_id, type, title, content, tool_name, project,
            scope, topic_key, normalized_hash, revision_count, duplicate_count,
            last_seen_at, created_at, updated_at, deleted_at
        )
        SELECT
            CASE
                WHEN id IS NULL THEN NULL
                WHEN ROW_NUMBER() OVER (PARTITION BY id ORDER BY rowid) = 1 THEN CAST(id AS INTEGER)
                ELSE NULL
            END,
            session_id,
            COALESCE(NULLIF(type, ''), 'manual'),
            COALESCE(NULLIF(title, ''), 'Untitled observation'),
            COALESCE(content, ''),
            tool_name,
            project,
            CASE WHEN scope IS NULL OR scope = '' THEN 'project' ELSE scope END,
            NULLIF(topic_key, ''),
            normalized_hash,
            CASE WHEN revision_count IS NULL OR revision_count < 1 THEN 1 ELSE revision_count END,
            CASE WHEN duplicate_count IS NULL OR duplicate_count < 1 THEN 1 ELSE duplicate_count END,
            last_seen_at,
            COALESCE(NULLIF(created_at, ''), datetime('now')),
            COALESCE(NULLIF(updated_at, ''), NULLIF(created_at, ''), datetime('now')),
            deleted_at
        FROM observations
        ORDER BY rowid;",
    )?;

    tx.execute_batch(
        "DROP TABLE observations;
        ALTER TABLE observations_migrated RENAME TO observations;

        DROP TRIGGER IF EXISTS obs_fts_insert;
        DROP TRIGGER IF EXISTS obs_fts_update;
        DROP TRIGGER IF EXISTS obs_fts_delete;
        DROP TABLE IF EXISTS observations_fts;
        CREATE VIRTUAL TABLE observations_fts USING fts5(
            title,
            content,
            tool_name,
            type,
            project,
            content='observations',
            content_rowid='id'
        );
        INSERT INTO observations_fts(rowid, title, content, tool_name, type, project)
        SELECT id, title, content, tool_name, type, project
        FROM observations
        WHERE deleted_at IS NULL;",
    )?;

    tx.commit()
}

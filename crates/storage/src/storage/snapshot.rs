//! Whole-database export/import and sync-chunk bookkeeping.

use std::collections::HashSet;

use engram_core::{
    content_hash, normalize_scope, normalize_topic_key, now, EngramError, ExportData, ImportResult,
    Result, Session,
};
use rusqlite::params;

use super::{db_err, map_observation, map_prompt, none_if_empty, Storage, OBSERVATION_COLUMNS};

const SNAPSHOT_VERSION: &str = "0.1.0";

impl Storage {
    /// Serializable dump of every table, soft-deleted rows included.
    pub fn export(&self) -> Result<ExportData> {
        self.export_project(None)
    }

    /// Like [`export`](Self::export), optionally restricted to one
    /// project: its sessions, the observations of those sessions, and the
    /// prompts of those sessions.
    pub fn export_project(&self, project: Option<&str>) -> Result<ExportData> {
        let project = none_if_empty(project);
        let conn = self.conn()?;

        let (session_sql, obs_sql, prompt_sql) = if project.is_some() {
            (
                "SELECT id, project, directory, started_at, ended_at, summary
                   FROM sessions WHERE project = ?1 ORDER BY started_at",
                format!(
                    "SELECT {OBSERVATION_COLUMNS} FROM observations
                      WHERE session_id IN (SELECT id FROM sessions WHERE project = ?1)
                      ORDER BY id"
                ),
                "SELECT id, session_id, content, project, created_at FROM user_prompts
                  WHERE session_id IN (SELECT id FROM sessions WHERE project = ?1)
                  ORDER BY id",
            )
        } else {
            (
                "SELECT id, project, directory, started_at, ended_at, summary
                   FROM sessions ORDER BY started_at",
                format!("SELECT {OBSERVATION_COLUMNS} FROM observations ORDER BY id"),
                "SELECT id, session_id, content, project, created_at FROM user_prompts ORDER BY id",
            )
        };

        let sessions = {
            let mut stmt = conn.prepare(session_sql).map_err(db_err("export sessions"))?;
            let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Session> {
                Ok(Session {
                    id: row.get(0)?,
                    project: row.get(1)?,
                    directory: row.get(2)?,
                    started_at: row.get(3)?,
                    ended_at: row.get(4)?,
                    summary: row.get(5)?,
                })
            };
            let rows = match project {
                Some(project) => stmt.query_map(params![project], map),
                None => stmt.query_map([], map),
            };
            let collected = rows
                .map_err(db_err("export sessions"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("export sessions"))?;
            collected
        };

        let observations = {
            let mut stmt = conn.prepare(&obs_sql).map_err(db_err("export observations"))?;
            let rows = match project {
                Some(project) => stmt.query_map(params![project], map_observation),
                None => stmt.query_map([], map_observation),
            };
            let collected = rows
                .map_err(db_err("export observations"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("export observations"))?;
            collected
        };

        let prompts = {
            let mut stmt = conn.prepare(prompt_sql).map_err(db_err("export prompts"))?;
            let rows = match project {
                Some(project) => stmt.query_map(params![project], map_prompt),
                None => stmt.query_map([], map_prompt),
            };
            let collected = rows
                .map_err(db_err("export prompts"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("export prompts"))?;
            collected
        };

        Ok(ExportData {
            version: SNAPSHOT_VERSION.to_owned(),
            exported_at: now(),
            sessions,
            observations,
            prompts,
        })
    }

    /// Imports a snapshot inside one transaction.
    ///
    /// Sessions dedup on id (`INSERT OR IGNORE`); observations are inserted
    /// with fresh autoincrement ids and a recomputed `normalized_hash`;
    /// prompts are appended verbatim. Any failure rolls the whole import
    /// back.
    pub fn import(&self, data: &ExportData) -> Result<ImportResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction().map_err(db_err("import"))?;

        let mut result = ImportResult::default();

        for session in &data.sessions {
            let affected = tx
                .execute(
                    "INSERT OR IGNORE INTO sessions (id, project, directory, started_at, ended_at, summary)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        session.id,
                        session.project,
                        session.directory,
                        session.started_at,
                        session.ended_at,
                        session.summary,
                    ],
                )
                .map_err(|e| {
                    EngramError::storage("import session", format!("{}: {e}", session.id))
                })?;
            result.sessions_imported += affected;
        }

        for obs in &data.observations {
            let topic_key = normalize_topic_key(obs.topic_key.as_deref().unwrap_or(""));
            let topic_key = none_if_empty(Some(topic_key.as_str())).map(str::to_owned);
            tx.execute(
                "INSERT INTO observations
                    (session_id, type, title, content, tool_name, project, scope, topic_key,
                     normalized_hash, revision_count, duplicate_count, last_seen_at,
                     created_at, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    obs.session_id,
                    obs.kind,
                    obs.title,
                    obs.content,
                    obs.tool_name,
                    obs.project,
                    normalize_scope(&obs.scope),
                    topic_key,
                    content_hash(&obs.content),
                    obs.revision_count.max(1),
                    obs.duplicate_count.max(1),
                    obs.last_seen_at,
                    obs.created_at,
                    obs.updated_at,
                    obs.deleted_at,
                ],
            )
            .map_err(|e| EngramError::storage("import observation", format!("#{}: {e}", obs.id)))?;
            result.observations_imported += 1;
        }

        for prompt in &data.prompts {
            tx.execute(
                "INSERT INTO user_prompts (session_id, content, project, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![prompt.session_id, prompt.content, prompt.project, prompt.created_at],
            )
            .map_err(|e| EngramError::storage("import prompt", format!("#{}: {e}", prompt.id)))?;
            result.prompts_imported += 1;
        }

        tx.commit().map_err(db_err("import"))?;
        Ok(result)
    }

    /// Chunk ids already applied to this database.
    pub fn synced_chunks(&self) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT chunk_id FROM sync_chunks").map_err(db_err("synced chunks"))?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err("synced chunks"))?
            .collect::<rusqlite::Result<HashSet<String>>>()
            .map_err(db_err("synced chunks"))?;
        Ok(ids)
    }

    /// Marks a chunk as applied so repeated imports skip it.
    pub fn record_synced_chunk(&self, chunk_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("INSERT OR IGNORE INTO sync_chunks (chunk_id) VALUES (?1)", params![chunk_id])
            .map_err(db_err("record synced chunk"))?;
        Ok(())
    }
}

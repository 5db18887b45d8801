use engram_core::{EngramError, Result, Session, SessionSummary};
use rusqlite::{params, OptionalExtension};

use super::{db_err, none_if_empty, Storage};

impl Storage {
    /// Registers a session. Calling again with the same id is a no-op, so
    /// adapters can create sessions on demand before every write.
    pub fn create_session(&self, id: &str, project: &str, directory: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(EngramError::Validation("session id is required".to_owned()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO sessions (id, project, directory) VALUES (?1, ?2, ?3)",
            params![id, project, directory],
        )
        .map_err(db_err("create session"))?;
        Ok(())
    }

    /// Stamps the end time and summary. Unknown ids are silent no-ops.
    pub fn end_session(&self, id: &str, summary: Option<&str>) -> Result<()> {
        if id.trim().is_empty() {
            return Err(EngramError::Validation("session id is required".to_owned()));
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE sessions SET ended_at = datetime('now'), summary = ?1 WHERE id = ?2",
            params![none_if_empty(summary), id],
        )
        .map_err(db_err("end session"))?;
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Session> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project, directory, started_at, ended_at, summary
               FROM sessions WHERE id = ?1",
            params![id],
            map_session,
        )
        .optional()
        .map_err(db_err("get session"))?
        .ok_or_else(|| EngramError::NotFound(format!("session {id:?}")))
    }

    /// Newest-first sessions with their live observation counts.
    pub fn recent_sessions(
        &self,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SessionSummary>> {
        self.list_sessions(project, if limit == 0 { 5 } else { limit })
    }

    /// Like [`recent_sessions`](Self::recent_sessions) with a browsing-sized
    /// default limit. Sessions carry no scope, so there is no scope filter.
    pub fn all_sessions(&self, project: Option<&str>, limit: usize) -> Result<Vec<SessionSummary>> {
        self.list_sessions(project, if limit == 0 { 50 } else { limit })
    }

    fn list_sessions(&self, project: Option<&str>, limit: usize) -> Result<Vec<SessionSummary>> {
        let mut sql = String::from(
            "SELECT s.id, s.project, s.started_at, s.ended_at, s.summary,
                    COUNT(o.id) AS observation_count
               FROM sessions s
               LEFT JOIN observations o ON o.session_id = s.id AND o.deleted_at IS NULL
              WHERE 1=1",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project) = none_if_empty(project) {
            sql.push_str(" AND s.project = ?");
            args.push(Box::new(project.to_owned()));
        }

        sql.push_str(" GROUP BY s.id ORDER BY s.started_at DESC LIMIT ?");
        args.push(Box::new(limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("list sessions"))?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params.as_slice(), |row| {
                Ok(SessionSummary {
                    id: row.get(0)?,
                    project: row.get(1)?,
                    started_at: row.get(2)?,
                    ended_at: row.get(3)?,
                    summary: row.get(4)?,
                    observation_count: row.get(5)?,
                })
            })
            .map_err(db_err("list sessions"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("list sessions"))?;
        Ok(rows)
    }
}

fn map_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        project: row.get(1)?,
        directory: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        summary: row.get(5)?,
    })
}

use std::fmt::Write as _;

use engram_core::{truncate_chars, Result, Stats};

use super::{db_err, Storage};

impl Storage {
    /// Totals of sessions, live observations, prompts, and the sorted
    /// distinct projects among live observations.
    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn()?;

        let total_sessions: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .map_err(db_err("stats"))?;
        let total_observations: i64 = conn
            .query_row("SELECT COUNT(*) FROM observations WHERE deleted_at IS NULL", [], |row| {
                row.get(0)
            })
            .map_err(db_err("stats"))?;
        let total_prompts: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_prompts", [], |row| row.get(0))
            .map_err(db_err("stats"))?;

        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT project FROM observations
                  WHERE project IS NOT NULL AND deleted_at IS NULL
                  ORDER BY project",
            )
            .map_err(db_err("stats"))?;
        let projects = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err("stats"))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_err("stats"))?;

        Ok(Stats { total_sessions, total_observations, total_prompts, projects })
    }

    /// Human-readable recap of recent memory: up to five sessions, ten
    /// prompts, and the configured context window of observations. Empty
    /// memory produces an empty string, not an error.
    pub fn format_context(&self, project: Option<&str>, scope: Option<&str>) -> Result<String> {
        let sessions = self.recent_sessions(project, 5)?;
        let observations =
            self.recent_observations(project, scope, self.config().max_context_results)?;
        let prompts = self.recent_prompts(project, 10)?;

        if sessions.is_empty() && observations.is_empty() && prompts.is_empty() {
            return Ok(String::new());
        }

        let mut out = String::from("## Memory from Previous Sessions\n\n");

        if !sessions.is_empty() {
            out.push_str("### Recent Sessions\n");
            for session in &sessions {
                let summary = session
                    .summary
                    .as_deref()
                    .map(|s| format!(": {}", truncate_chars(s, 200)))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "- **{}** ({}){} [{} observations]",
                    session.project, session.started_at, summary, session.observation_count
                );
            }
            out.push('\n');
        }

        if !prompts.is_empty() {
            out.push_str("### Recent User Prompts\n");
            for prompt in &prompts {
                let _ = writeln!(
                    out,
                    "- {}: {}",
                    prompt.created_at,
                    truncate_chars(&prompt.content, 200)
                );
            }
            out.push('\n');
        }

        if !observations.is_empty() {
            out.push_str("### Recent Observations\n");
            for obs in &observations {
                let _ = writeln!(
                    out,
                    "- [{}] **{}**: {}",
                    obs.kind,
                    obs.title,
                    truncate_chars(&obs.content, 300)
                );
            }
            out.push('\n');
        }

        Ok(out)
    }
}

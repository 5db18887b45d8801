use engram_core::{
    sanitize_fts_query, strip_private_tags, truncate_with_marker, AddPromptParams, EngramError,
    Prompt, Result,
};

use super::{db_err, map_prompt, none_if_empty, Storage};

impl Storage {
    /// Appends a user prompt. Prompts are redacted and truncated like
    /// observation content but never deduplicated or updated.
    pub fn add_prompt(&self, p: &AddPromptParams) -> Result<i64> {
        if p.session_id.trim().is_empty() {
            return Err(EngramError::Validation("session_id is required".to_owned()));
        }
        if p.content.trim().is_empty() {
            return Err(EngramError::Validation("content is required".to_owned()));
        }

        let content = truncate_with_marker(
            &strip_private_tags(&p.content),
            self.config().max_observation_length,
        );

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_prompts (session_id, content, project) VALUES (?1, ?2, ?3)",
            rusqlite::params![p.session_id, content, none_if_empty(p.project.as_deref())],
        )
        .map_err(db_err("add prompt"))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn recent_prompts(&self, project: Option<&str>, limit: usize) -> Result<Vec<Prompt>> {
        let limit = if limit == 0 { 20 } else { limit };

        let mut sql =
            String::from("SELECT id, session_id, content, project, created_at FROM user_prompts");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project) = none_if_empty(project) {
            sql.push_str(" WHERE project = ?");
            args.push(Box::new(project.to_owned()));
        }

        sql.push_str(" ORDER BY created_at DESC LIMIT ?");
        args.push(Box::new(limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("recent prompts"))?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params.as_slice(), map_prompt)
            .map_err(db_err("recent prompts"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("recent prompts"));
        rows
    }

    /// Ranked full-text search over prompts, mirroring observation search.
    pub fn search_prompts(
        &self,
        query: &str,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Prompt>> {
        let limit = if limit == 0 { 10 } else { limit };

        let fts_query = sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT p.id, p.session_id, p.content, p.project, p.created_at
               FROM prompts_fts fts
               JOIN user_prompts p ON p.id = fts.rowid
              WHERE prompts_fts MATCH ?",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(fts_query)];

        if let Some(project) = none_if_empty(project) {
            sql.push_str(" AND p.project = ?");
            args.push(Box::new(project.to_owned()));
        }

        sql.push_str(" ORDER BY fts.rank LIMIT ?");
        args.push(Box::new(limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("search prompts"))?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params.as_slice(), map_prompt)
            .map_err(db_err("search prompts"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("search prompts"));
        rows
    }
}

use engram_core::{
    content_hash, normalize_scope, normalize_topic_key, strip_private_tags, truncate_with_marker,
    AddObservationParams, EngramError, Observation, Result, UpdateObservationParams,
};
use rusqlite::{params, OptionalExtension};

use super::{db_err, map_observation, none_if_empty, Storage, OBSERVATION_COLUMNS};

/// How a write landed: a fresh row, a topic-key upsert, or a dedup merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Inserted,
    Upserted,
    Deduplicated,
}

impl Storage {
    /// Saves an observation, returning the id of the row that now carries
    /// it.
    ///
    /// Topic-keyed writes update the current row for the
    /// `(topic_key, project, scope)` triple in place; otherwise an
    /// identical-content write inside the dedupe window merges into the
    /// existing row. Only when neither matches is a new row inserted.
    pub fn add_observation(&self, params: &AddObservationParams) -> Result<i64> {
        self.add_observation_outcome(params).map(|(id, _)| id)
    }

    pub(crate) fn add_observation_outcome(
        &self,
        p: &AddObservationParams,
    ) -> Result<(i64, WriteOutcome)> {
        if p.session_id.trim().is_empty() {
            return Err(EngramError::Validation("session_id is required".to_owned()));
        }

        let title = strip_private_tags(&p.title);
        let content = truncate_with_marker(
            &strip_private_tags(&p.content),
            self.config().max_observation_length,
        );
        let scope = normalize_scope(p.scope.as_deref().unwrap_or(""));
        let normalized_hash = content_hash(&content);
        let topic_key = normalize_topic_key(p.topic_key.as_deref().unwrap_or(""));
        let project = none_if_empty(p.project.as_deref());
        let tool_name = none_if_empty(p.tool_name.as_deref());

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction().map_err(db_err("add observation"))?;

        // Topic-keyed writes win over hash dedup: if a current row exists
        // for the triple, refresh it in place and bump the revision.
        if !topic_key.is_empty() {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM observations
                      WHERE topic_key = ?1
                        AND ifnull(project, '') = ifnull(?2, '')
                        AND scope = ?3
                        AND deleted_at IS NULL
                      ORDER BY datetime(updated_at) DESC, datetime(created_at) DESC
                      LIMIT 1",
                    params![topic_key, project, scope],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err("add observation"))?;

            if let Some(id) = existing {
                tx.execute(
                    "UPDATE observations
                        SET type = ?1,
                            title = ?2,
                            content = ?3,
                            tool_name = ?4,
                            topic_key = ?5,
                            normalized_hash = ?6,
                            revision_count = revision_count + 1,
                            last_seen_at = datetime('now'),
                            updated_at = datetime('now')
                      WHERE id = ?7",
                    params![p.kind, title, content, tool_name, topic_key, normalized_hash, id],
                )
                .map_err(db_err("add observation"))?;
                tx.commit().map_err(db_err("add observation"))?;
                return Ok((id, WriteOutcome::Upserted));
            }
        }

        let window = self.config().dedupe_window_modifier();
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM observations
                  WHERE normalized_hash = ?1
                    AND ifnull(project, '') = ifnull(?2, '')
                    AND scope = ?3
                    AND type = ?4
                    AND title = ?5
                    AND deleted_at IS NULL
                    AND datetime(created_at) >= datetime('now', ?6)
                  ORDER BY created_at DESC
                  LIMIT 1",
                params![normalized_hash, project, scope, p.kind, title, window],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err("add observation"))?;

        if let Some(id) = existing {
            tx.execute(
                "UPDATE observations
                    SET duplicate_count = duplicate_count + 1,
                        last_seen_at = datetime('now'),
                        updated_at = datetime('now')
                  WHERE id = ?1",
                params![id],
            )
            .map_err(db_err("add observation"))?;
            tx.commit().map_err(db_err("add observation"))?;
            return Ok((id, WriteOutcome::Deduplicated));
        }

        tx.execute(
            "INSERT INTO observations
                (session_id, type, title, content, tool_name, project, scope, topic_key,
                 normalized_hash, revision_count, duplicate_count, last_seen_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, 1, datetime('now'), datetime('now'))",
            params![
                p.session_id,
                p.kind,
                title,
                content,
                tool_name,
                project,
                scope,
                none_if_empty(Some(topic_key.as_str())),
                normalized_hash,
            ],
        )
        .map_err(db_err("add observation"))?;
        let id = tx.last_insert_rowid();
        tx.commit().map_err(db_err("add observation"))?;
        Ok((id, WriteOutcome::Inserted))
    }

    /// Fetches a live observation; soft-deleted rows are not found.
    pub fn get_observation(&self, id: i64) -> Result<Observation> {
        if id <= 0 {
            return Err(EngramError::Validation("observation id is required".to_owned()));
        }
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE id = ?1 AND deleted_at IS NULL"
        );
        conn.query_row(&sql, params![id], map_observation)
            .optional()
            .map_err(db_err("get observation"))?
            .ok_or_else(|| EngramError::NotFound(format!("observation #{id}")))
    }

    /// Applies a partial update, always bumping `revision_count` and
    /// `updated_at` and recomputing the dedup hash from the final content.
    /// `created_at`, `last_seen_at`, and `duplicate_count` are untouched.
    pub fn update_observation(
        &self,
        id: i64,
        p: &UpdateObservationParams,
    ) -> Result<Observation> {
        if id <= 0 {
            return Err(EngramError::Validation("observation id is required".to_owned()));
        }
        if p.is_empty() {
            return Err(EngramError::Validation(
                "provide at least one field to update".to_owned(),
            ));
        }

        let existing = self.get_observation(id)?;

        let kind = p.kind.clone().unwrap_or(existing.kind);
        let title = match &p.title {
            Some(title) => strip_private_tags(title),
            None => existing.title,
        };
        let content = match &p.content {
            Some(content) => truncate_with_marker(
                &strip_private_tags(content),
                self.config().max_observation_length,
            ),
            None => existing.content,
        };
        let project = match &p.project {
            Some(project) => project.clone(),
            None => existing.project.unwrap_or_default(),
        };
        let scope = match &p.scope {
            Some(scope) => normalize_scope(scope).to_owned(),
            None => existing.scope,
        };
        let topic_key = match &p.topic_key {
            Some(topic_key) => normalize_topic_key(topic_key),
            None => existing.topic_key.unwrap_or_default(),
        };

        let conn = self.conn()?;
        conn.execute(
            "UPDATE observations
                SET type = ?1,
                    title = ?2,
                    content = ?3,
                    project = ?4,
                    scope = ?5,
                    topic_key = ?6,
                    normalized_hash = ?7,
                    revision_count = revision_count + 1,
                    updated_at = datetime('now')
              WHERE id = ?8 AND deleted_at IS NULL",
            params![
                kind,
                title,
                content,
                none_if_empty(Some(project.as_str())),
                scope,
                none_if_empty(Some(topic_key.as_str())),
                content_hash(&content),
                id,
            ],
        )
        .map_err(db_err("update observation"))?;

        self.get_observation(id)
    }

    /// Soft delete hides the row from every read path; hard delete removes
    /// it outright. Re-deleting an already-hidden row is a silent no-op.
    pub fn delete_observation(&self, id: i64, hard_delete: bool) -> Result<()> {
        if id <= 0 {
            return Err(EngramError::Validation("observation id is required".to_owned()));
        }
        let conn = self.conn()?;
        if hard_delete {
            conn.execute("DELETE FROM observations WHERE id = ?1", params![id])
                .map_err(db_err("delete observation"))?;
        } else {
            conn.execute(
                "UPDATE observations
                    SET deleted_at = datetime('now'),
                        updated_at = datetime('now')
                  WHERE id = ?1 AND deleted_at IS NULL",
                params![id],
            )
            .map_err(db_err("delete observation"))?;
        }
        Ok(())
    }

    /// Newest-first live observations, optionally filtered by project and
    /// scope. A zero limit falls back to the context window size.
    pub fn recent_observations(
        &self,
        project: Option<&str>,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        self.list_observations(project, scope, limit)
    }

    /// Browsing variant of [`recent_observations`](Self::recent_observations);
    /// same ordering, caller-sized limit.
    pub fn all_observations(
        &self,
        project: Option<&str>,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        self.list_observations(project, scope, limit)
    }

    fn list_observations(
        &self,
        project: Option<&str>,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Observation>> {
        let limit = if limit == 0 { self.config().max_context_results } else { limit };

        let mut sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE deleted_at IS NULL"
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project) = none_if_empty(project) {
            sql.push_str(" AND project = ?");
            args.push(Box::new(project.to_owned()));
        }
        if let Some(scope) = none_if_empty(scope) {
            sql.push_str(" AND scope = ?");
            args.push(Box::new(normalize_scope(scope).to_owned()));
        }

        sql.push_str(" ORDER BY created_at DESC LIMIT ?");
        args.push(Box::new(limit as i64));

        self.query_observations(&sql, &args, "list observations")
    }

    /// All live observations of one session in chronological order.
    pub fn session_observations(&self, session_id: &str, limit: usize) -> Result<Vec<Observation>> {
        let limit = if limit == 0 { 200 } else { limit };
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations
              WHERE session_id = ? AND deleted_at IS NULL
              ORDER BY created_at ASC, id ASC
              LIMIT ?"
        );
        let args: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(session_id.to_owned()), Box::new(limit as i64)];
        self.query_observations(&sql, &args, "session observations")
    }

    pub(crate) fn query_observations(
        &self,
        sql: &str,
        args: &[Box<dyn rusqlite::ToSql>],
        op: &'static str,
    ) -> Result<Vec<Observation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(db_err(op))?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params.as_slice(), map_observation)
            .map_err(db_err(op))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err(op));
        rows
    }
}

//! Chronological context around a focus observation.
//!
//! Agents search first, then drill into the timeline of a result. The
//! neighborhood is ordered by id rather than `created_at`: ids are
//! monotonic, cheap to index, and stable when batched inserts share a
//! timestamp.

use engram_core::{EngramError, Result, TimelineResult};
use rusqlite::params;

use super::{db_err, Storage, OBSERVATION_COLUMNS};

impl Storage {
    /// Returns up to `before`/`after` live neighbors of the focus
    /// observation within its session, both in chronological order, plus
    /// the session (when it still exists) and the session's live total.
    /// `None` bounds default to 5; explicit bounds must be positive.
    pub fn timeline(
        &self,
        observation_id: i64,
        before: Option<i64>,
        after: Option<i64>,
    ) -> Result<TimelineResult> {
        let before = bound("before", before)?;
        let after = bound("after", after)?;

        let focus = self.get_observation(observation_id)?;

        // Sessions can be missing for manual-save observations imported
        // from elsewhere; that is not an error.
        let session_info = match self.get_session(&focus.session_id) {
            Ok(session) => Some(session),
            Err(EngramError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };

        let before_sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations
              WHERE session_id = ? AND id < ? AND deleted_at IS NULL
              ORDER BY id DESC
              LIMIT ?"
        );
        let args: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(focus.session_id.clone()),
            Box::new(observation_id),
            Box::new(before),
        ];
        let mut before_rows = self.query_observations(&before_sql, &args, "timeline")?;
        before_rows.reverse();

        let after_sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations
              WHERE session_id = ? AND id > ? AND deleted_at IS NULL
              ORDER BY id ASC
              LIMIT ?"
        );
        let args: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(focus.session_id.clone()),
            Box::new(observation_id),
            Box::new(after),
        ];
        let after_rows = self.query_observations(&after_sql, &args, "timeline")?;

        let conn = self.conn()?;
        let total_in_range: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM observations WHERE session_id = ?1 AND deleted_at IS NULL",
                params![focus.session_id],
                |row| row.get(0),
            )
            .map_err(db_err("timeline"))?;

        Ok(TimelineResult {
            focus,
            before: before_rows,
            after: after_rows,
            session_info,
            total_in_range,
        })
    }
}

fn bound(name: &str, value: Option<i64>) -> Result<i64> {
    match value {
        None => Ok(5),
        Some(n) if n > 0 => Ok(n),
        Some(n) => Err(EngramError::Validation(format!("{name} must be positive, got {n}"))),
    }
}

//! Ranked full-text search over observations.

use engram_core::{normalize_scope, sanitize_fts_query, Result, SearchOptions, SearchResult};

use super::{db_err, map_observation, none_if_empty, Storage, OBSERVATION_COLUMNS};

impl Storage {
    /// FTS5 search joined back to the base table, live rows only, best
    /// match first (`fts.rank` ascending). The query is sanitized so no
    /// input can produce a MATCH syntax error; a query with no usable
    /// tokens matches nothing.
    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResult>> {
        let mut limit = opts.limit.unwrap_or(10);
        if limit == 0 {
            limit = 10;
        }
        let limit = limit.min(self.config().max_search_results);

        let fts_query = sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let columns: String =
            OBSERVATION_COLUMNS.split(", ").map(|c| format!("o.{c}")).collect::<Vec<_>>().join(", ");
        let mut sql = format!(
            "SELECT {columns}, fts.rank
               FROM observations_fts fts
               JOIN observations o ON o.id = fts.rowid
              WHERE observations_fts MATCH ? AND o.deleted_at IS NULL"
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(fts_query)];

        if let Some(kind) = none_if_empty(opts.kind.as_deref()) {
            sql.push_str(" AND o.type = ?");
            args.push(Box::new(kind.to_owned()));
        }
        if let Some(project) = none_if_empty(opts.project.as_deref()) {
            sql.push_str(" AND o.project = ?");
            args.push(Box::new(project.to_owned()));
        }
        if let Some(scope) = none_if_empty(opts.scope.as_deref()) {
            sql.push_str(" AND o.scope = ?");
            args.push(Box::new(normalize_scope(scope).to_owned()));
        }

        sql.push_str(" ORDER BY fts.rank LIMIT ?");
        args.push(Box::new(limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("search"))?;
        let params: Vec<&dyn rusqlite::ToSql> = args.iter().map(AsRef::as_ref).collect();
        let rows = stmt
            .query_map(params.as_slice(), |row| {
                Ok(SearchResult { observation: map_observation(row)?, rank: row.get(15)? })
            })
            .map_err(db_err("search"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("search"));
        rows
    }
}

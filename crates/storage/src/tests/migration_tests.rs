use std::collections::HashSet;
use std::time::Duration;

use engram_core::{Config, SearchOptions};
use tempfile::TempDir;

use super::{obs, test_store};
use crate::Storage;

/// Seeds a database whose observations table predates the declared primary
/// key: `id` is plain INT, with a NULL and a duplicated value.
fn seed_legacy_db(dir: &TempDir) {
    let conn = rusqlite::Connection::open(dir.path().join("engram.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE sessions (
            id TEXT PRIMARY KEY,
            project TEXT NOT NULL,
            directory TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            ended_at TEXT,
            summary TEXT
        );
        CREATE TABLE observations (
            id INT,
            session_id TEXT,
            type TEXT,
            title TEXT,
            content TEXT,
            tool_name TEXT,
            project TEXT,
            created_at TEXT
        );
        INSERT INTO sessions (id, project, directory) VALUES ('s1', 'engram', '/tmp/engram');
        INSERT INTO observations (id, session_id, type, title, content, project, created_at)
        VALUES
            (NULL, 's1', 'bugfix', 'legacy null', 'legacy null content', 'engram', datetime('now')),
            (7, 's1', 'bugfix', 'legacy fixed', 'legacy fixed content', 'engram', datetime('now')),
            (7, 's1', '', '', 'legacy duplicate content', 'engram', datetime('now'));",
    )
    .unwrap();
    drop(conn);
}

#[test]
fn open_migrates_legacy_observations_schema() {
    let dir = TempDir::new().unwrap();
    seed_legacy_db(&dir);

    let cfg = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };
    let store = Storage::open(cfg).unwrap();

    let rows = store.all_observations(Some("engram"), None, 20).unwrap();
    assert_eq!(rows.len(), 3);

    let mut seen = HashSet::new();
    for row in &rows {
        assert!(row.id > 0, "migrated id must be positive, got {}", row.id);
        assert!(seen.insert(row.id), "duplicate migrated id {}", row.id);
    }
    // The first occurrence of the duplicate family keeps its original id.
    assert!(seen.contains(&7));

    // Empty type and title were coerced during the copy.
    assert!(rows.iter().any(|o| o.kind == "manual" && o.title == "Untitled observation"));

    // FTS was rebuilt from the migrated rows.
    let hits = store
        .search("legacy", &SearchOptions { project: Some("engram".to_owned()), ..Default::default() })
        .unwrap();
    assert!(!hits.is_empty());

    // New inserts keep receiving monotonically increasing ids.
    let new_id = store.add_observation(&obs("s1", "bugfix", "post migration", "new row should get id")).unwrap();
    assert!(new_id > *seen.iter().max().unwrap());
}

#[test]
fn migration_is_one_shot_and_reopen_is_idempotent() {
    let dir = TempDir::new().unwrap();
    seed_legacy_db(&dir);

    let cfg = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };
    {
        let store = Storage::open(cfg.clone()).unwrap();
        assert_eq!(store.all_observations(None, None, 20).unwrap().len(), 3);
    }

    // Second open must not re-migrate or duplicate anything.
    let store = Storage::open(cfg).unwrap();
    let rows = store.all_observations(None, None, 20).unwrap();
    assert_eq!(rows.len(), 3);
    let ids: HashSet<i64> = rows.iter().map(|o| o.id).collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn reopening_a_fresh_store_preserves_data() {
    let (store, dir) = test_store();
    store.create_session("s1", "engram", "/tmp/engram").unwrap();
    let id = store.add_observation(&obs("s1", "manual", "persisted", "should survive reopen")).unwrap();
    drop(store);

    let cfg = Config {
        data_dir: dir.path().to_path_buf(),
        dedupe_window: Duration::from_secs(3600),
        ..Config::default()
    };
    let store = Storage::open(cfg).unwrap();
    let row = store.get_observation(id).unwrap();
    assert_eq!(row.title, "persisted");
}

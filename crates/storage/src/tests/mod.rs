//! Test helpers and module declarations for storage tests.

use std::time::Duration;

use engram_core::{AddObservationParams, Config};
use tempfile::TempDir;

use crate::Storage;

mod migration_tests;
mod observation_tests;
mod prompt_tests;
mod snapshot_tests;
mod stats_tests;
mod timeline_tests;

/// Fresh store in a temp dir. The dedupe window is widened to an hour so
/// dedup tests are immune to timestamp granularity.
pub fn test_store() -> (Storage, TempDir) {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        data_dir: dir.path().to_path_buf(),
        dedupe_window: Duration::from_secs(3600),
        ..Config::default()
    };
    let store = Storage::open(cfg).unwrap();
    (store, dir)
}

pub fn obs(session: &str, kind: &str, title: &str, content: &str) -> AddObservationParams {
    AddObservationParams {
        session_id: session.to_owned(),
        kind: kind.to_owned(),
        title: title.to_owned(),
        content: content.to_owned(),
        project: Some("engram".to_owned()),
        scope: Some("project".to_owned()),
        ..Default::default()
    }
}

pub fn seed_session(store: &Storage) {
    store.create_session("s1", "engram", "/tmp/engram").unwrap();
}

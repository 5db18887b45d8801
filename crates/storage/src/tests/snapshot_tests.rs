use super::{obs, seed_session, test_store};

#[test]
fn export_import_round_trip_preserves_counts_and_counters() {
    let (source, _src_dir) = test_store();
    seed_session(&source);

    // One topic-upserted row (revision 2) and one deduped row (duplicate 2).
    let mut topical = obs("s1", "architecture", "Auth model", "v1 of the auth model");
    topical.topic_key = Some("architecture/auth-model".to_owned());
    source.add_observation(&topical).unwrap();
    topical.content = "v2 of the auth model".to_owned();
    source.add_observation(&topical).unwrap();

    source.add_observation(&obs("s1", "bugfix", "Fixed tokenizer", "tokenizer panic fixed")).unwrap();
    source.add_observation(&obs("s1", "bugfix", "Fixed tokenizer", "tokenizer  panic  FIXED")).unwrap();

    source
        .add_prompt(&engram_core::AddPromptParams {
            session_id: "s1".to_owned(),
            content: "fix the tokenizer".to_owned(),
            project: Some("engram".to_owned()),
        })
        .unwrap();

    let data = source.export().unwrap();
    assert_eq!(data.sessions.len(), 1);
    assert_eq!(data.observations.len(), 2);
    assert_eq!(data.prompts.len(), 1);

    let (target, _dst_dir) = test_store();
    let result = target.import(&data).unwrap();
    assert_eq!(result.sessions_imported, 1);
    assert_eq!(result.observations_imported, 2);
    assert_eq!(result.prompts_imported, 1);

    let rows = target.all_observations(Some("engram"), None, 10).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|o| o.revision_count == 2 && o.content.contains("v2")));
    assert!(rows.iter().any(|o| o.duplicate_count == 2));
    assert!(rows
        .iter()
        .any(|o| o.topic_key.as_deref() == Some("architecture/auth-model")));
}

#[test]
fn import_into_same_store_skips_known_sessions() {
    let (store, _dir) = test_store();
    seed_session(&store);
    store.add_observation(&obs("s1", "manual", "t", "c")).unwrap();

    let data = store.export().unwrap();
    let result = store.import(&data).unwrap();

    // Session id already present; observation rows are appended with new ids.
    assert_eq!(result.sessions_imported, 0);
    assert_eq!(result.observations_imported, 1);
    assert_eq!(store.all_observations(None, None, 10).unwrap().len(), 2);
}

#[test]
fn project_filtered_export_follows_session_ownership() {
    let (store, _dir) = test_store();
    store.create_session("s-engram", "engram", "/tmp/engram").unwrap();
    store.create_session("s-other", "other", "/tmp/other").unwrap();

    store.add_observation(&obs("s-engram", "manual", "ours", "engram note")).unwrap();
    let mut foreign = obs("s-other", "manual", "theirs", "other note");
    foreign.project = Some("other".to_owned());
    store.add_observation(&foreign).unwrap();

    store
        .add_prompt(&engram_core::AddPromptParams {
            session_id: "s-other".to_owned(),
            content: "prompt for the other project".to_owned(),
            project: Some("other".to_owned()),
        })
        .unwrap();

    let data = store.export_project(Some("engram")).unwrap();
    assert_eq!(data.sessions.len(), 1);
    assert_eq!(data.sessions[0].id, "s-engram");
    assert_eq!(data.observations.len(), 1);
    assert_eq!(data.observations[0].title, "ours");
    assert!(data.prompts.is_empty());
}

#[test]
fn export_includes_soft_deleted_rows() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let id = store.add_observation(&obs("s1", "manual", "hidden", "soft deleted")).unwrap();
    store.delete_observation(id, false).unwrap();

    let data = store.export().unwrap();
    assert_eq!(data.observations.len(), 1);
    assert!(data.observations[0].deleted_at.is_some());
}

#[test]
fn sync_chunk_records_are_idempotent() {
    let (store, _dir) = test_store();

    assert!(store.synced_chunks().unwrap().is_empty());
    store.record_synced_chunk("abc123").unwrap();
    store.record_synced_chunk("abc123").unwrap();

    let chunks = store.synced_chunks().unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks.contains("abc123"));
}

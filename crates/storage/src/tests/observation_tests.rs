use engram_core::{AddObservationParams, EngramError, UpdateObservationParams};

use super::{obs, seed_session, test_store};

#[test]
fn dedup_merges_whitespace_equivalent_content_within_window() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let first = store
        .add_observation(&obs("s1", "bugfix", "Fixed tokenizer", "Normalized tokenizer panic on edge case"))
        .unwrap();
    let second = store
        .add_observation(&obs("s1", "bugfix", "Fixed tokenizer", "normalized   tokenizer panic on EDGE case"))
        .unwrap();

    assert_eq!(first, second);
    let row = store.get_observation(first).unwrap();
    assert_eq!(row.duplicate_count, 2);
    assert_eq!(row.revision_count, 1);
}

#[test]
fn dedup_respects_type_and_title() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let first = store.add_observation(&obs("s1", "bugfix", "one", "same content here")).unwrap();
    let other_title =
        store.add_observation(&obs("s1", "bugfix", "two", "same content here")).unwrap();
    let other_type =
        store.add_observation(&obs("s1", "decision", "one", "same content here")).unwrap();

    assert_ne!(first, other_title);
    assert_ne!(first, other_type);
}

#[test]
fn topic_upsert_updates_in_place() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let mut first = obs("s1", "architecture", "Auth architecture", "Use middleware for JWT validation.");
    first.topic_key = Some("architecture auth model".to_owned());
    let first_id = store.add_observation(&first).unwrap();

    let mut second = obs("s1", "architecture", "Auth architecture", "Move auth to gateway + middleware chain.");
    second.topic_key = Some("ARCHITECTURE   AUTH  MODEL".to_owned());
    let second_id = store.add_observation(&second).unwrap();

    assert_eq!(first_id, second_id);
    let row = store.get_observation(first_id).unwrap();
    assert_eq!(row.revision_count, 2);
    assert_eq!(row.topic_key.as_deref(), Some("architecture-auth-model"));
    assert!(row.content.contains("gateway"));
}

#[test]
fn topic_upsert_wins_over_dedup() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let mut params = obs("s1", "architecture", "Auth", "identical content");
    params.topic_key = Some("architecture/auth".to_owned());

    let first = store.add_observation(&params).unwrap();
    let second = store.add_observation(&params).unwrap();

    assert_eq!(first, second);
    let row = store.get_observation(first).unwrap();
    // Same content, but the topic branch ran: revisions bump, duplicates don't.
    assert_eq!(row.revision_count, 2);
    assert_eq!(row.duplicate_count, 1);
}

#[test]
fn topic_upsert_is_scoped_by_project_and_scope() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let mut base = obs("s1", "architecture", "Auth model", "Initial architecture");
    base.topic_key = Some("architecture/auth-model".to_owned());
    let base_id = store.add_observation(&base).unwrap();

    let mut personal = base.clone();
    personal.content = "Personal take".to_owned();
    personal.scope = Some("personal".to_owned());
    let personal_id = store.add_observation(&personal).unwrap();

    let mut other = base.clone();
    other.content = "Other project".to_owned();
    other.project = Some("another-project".to_owned());
    let other_id = store.add_observation(&other).unwrap();

    assert_ne!(base_id, personal_id);
    assert_ne!(base_id, other_id);
    assert_ne!(personal_id, other_id);
}

#[test]
fn different_topics_do_not_replace_each_other() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let mut arch = obs("s1", "architecture", "Auth architecture", "Architecture decision");
    arch.topic_key = Some("architecture/auth".to_owned());
    let arch_id = store.add_observation(&arch).unwrap();

    let mut bug = obs("s1", "bugfix", "Fix auth nil panic", "Bugfix details");
    bug.topic_key = Some("bug/auth-nil-panic".to_owned());
    let bug_id = store.add_observation(&bug).unwrap();

    assert_ne!(arch_id, bug_id);
    let all = store.all_observations(Some("engram"), Some("project"), 10).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn private_tags_never_reach_storage() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let id = store
        .add_observation(&obs(
            "s1",
            "config",
            "Deploy <private>token=abc</private> notes",
            "Set <private>API_KEY=sk-999</private> in the environment",
        ))
        .unwrap();

    let row = store.get_observation(id).unwrap();
    assert!(!row.title.contains("token=abc"));
    assert!(!row.content.contains("sk-999"));
    assert!(row.title.contains("[REDACTED]"));
    assert!(row.content.contains("[REDACTED]"));
}

#[test]
fn long_content_is_truncated_with_marker() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let long = "x".repeat(2_500);
    let id = store.add_observation(&obs("s1", "manual", "big", &long)).unwrap();

    let row = store.get_observation(id).unwrap();
    assert!(row.content.ends_with("... [truncated]"));
    assert_eq!(row.content.len(), 2_000 + "... [truncated]".len());
}

#[test]
fn add_requires_session_id() {
    let (store, _dir) = test_store();
    let params = AddObservationParams {
        session_id: String::new(),
        kind: "manual".to_owned(),
        title: "t".to_owned(),
        content: "c".to_owned(),
        ..Default::default()
    };
    assert!(matches!(store.add_observation(&params), Err(EngramError::Validation(_))));
}

#[test]
fn add_rejects_unknown_session() {
    let (store, _dir) = test_store();
    let err = store.add_observation(&obs("ghost", "manual", "t", "c")).unwrap_err();
    assert!(matches!(err, EngramError::Storage { .. }));
}

#[test]
fn scope_outside_vocabulary_coerces_to_project() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let mut params = obs("s1", "manual", "t", "c");
    params.scope = Some("team".to_owned());
    let id = store.add_observation(&params).unwrap();
    assert_eq!(store.get_observation(id).unwrap().scope, "project");
}

#[test]
fn update_applies_fields_and_bumps_revision() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let id = store.add_observation(&obs("s1", "bugfix", "last", "last event")).unwrap();
    let created_at = store.get_observation(id).unwrap().created_at;

    let updated = store
        .update_observation(
            id,
            &UpdateObservationParams {
                title: Some("last-updated".to_owned()),
                content: Some("updated content".to_owned()),
                scope: Some("personal".to_owned()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "last-updated");
    assert_eq!(updated.content, "updated content");
    assert_eq!(updated.scope, "personal");
    assert_eq!(updated.revision_count, 2);
    assert_eq!(updated.created_at, created_at);
    assert_eq!(updated.duplicate_count, 1);
}

#[test]
fn update_rejects_empty_request_and_missing_rows() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let id = store.add_observation(&obs("s1", "bugfix", "t", "c")).unwrap();
    assert!(matches!(
        store.update_observation(id, &UpdateObservationParams::default()),
        Err(EngramError::Validation(_))
    ));
    assert!(matches!(
        store.update_observation(
            9_999,
            &UpdateObservationParams { title: Some("x".to_owned()), ..Default::default() }
        ),
        Err(EngramError::NotFound(_))
    ));
}

#[test]
fn soft_delete_hides_and_hard_delete_removes() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let soft = store.add_observation(&obs("s1", "bugfix", "soft", "to be hidden")).unwrap();
    let hard = store.add_observation(&obs("s1", "bugfix", "hard", "to be removed")).unwrap();

    store.delete_observation(soft, false).unwrap();
    assert!(matches!(store.get_observation(soft), Err(EngramError::NotFound(_))));
    // Hidden rows are not updatable.
    assert!(matches!(
        store.update_observation(
            soft,
            &UpdateObservationParams { title: Some("x".to_owned()), ..Default::default() }
        ),
        Err(EngramError::NotFound(_))
    ));
    // Re-deleting is a silent no-op.
    store.delete_observation(soft, false).unwrap();

    store.delete_observation(hard, true).unwrap();
    assert!(matches!(store.get_observation(hard), Err(EngramError::NotFound(_))));
}

#[test]
fn recent_observations_filters_and_orders() {
    let (store, _dir) = test_store();
    seed_session(&store);
    store.create_session("s2", "other", "/tmp/other").unwrap();

    store.add_observation(&obs("s1", "manual", "a", "first engram note")).unwrap();
    let mut foreign = obs("s2", "manual", "b", "note for another project");
    foreign.project = Some("other".to_owned());
    store.add_observation(&foreign).unwrap();

    let engram_only = store.recent_observations(Some("engram"), None, 10).unwrap();
    assert_eq!(engram_only.len(), 1);
    assert_eq!(engram_only[0].title, "a");

    let everything = store.recent_observations(None, None, 10).unwrap();
    assert_eq!(everything.len(), 2);
}

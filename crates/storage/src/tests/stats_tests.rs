use super::{obs, seed_session, test_store};

#[test]
fn stats_report_live_totals_and_sorted_projects() {
    let (store, _dir) = test_store();
    seed_session(&store);
    store.create_session("s2", "zebra", "/tmp/zebra").unwrap();

    store.add_observation(&obs("s1", "manual", "a", "note one")).unwrap();
    let mut zebra = obs("s2", "manual", "b", "note two");
    zebra.project = Some("zebra".to_owned());
    store.add_observation(&zebra).unwrap();
    let hidden = store.add_observation(&obs("s1", "manual", "c", "note three")).unwrap();
    store.delete_observation(hidden, false).unwrap();

    store
        .add_prompt(&engram_core::AddPromptParams {
            session_id: "s1".to_owned(),
            content: "a prompt".to_owned(),
            project: None,
        })
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_observations, 2);
    assert_eq!(stats.total_prompts, 1);
    assert_eq!(stats.projects, vec!["engram".to_owned(), "zebra".to_owned()]);
}

#[test]
fn format_context_is_empty_for_empty_memory() {
    let (store, _dir) = test_store();
    assert_eq!(store.format_context(None, None).unwrap(), "");
}

#[test]
fn format_context_lists_sessions_prompts_and_observations() {
    let (store, _dir) = test_store();
    seed_session(&store);
    store.end_session("s1", Some("shipped the auth middleware")).unwrap();

    store.add_observation(&obs("s1", "decision", "Auth direction", "gateway first")).unwrap();
    store
        .add_prompt(&engram_core::AddPromptParams {
            session_id: "s1".to_owned(),
            content: "please add auth".to_owned(),
            project: Some("engram".to_owned()),
        })
        .unwrap();

    let context = store.format_context(Some("engram"), None).unwrap();
    assert!(context.contains("## Memory from Previous Sessions"));
    assert!(context.contains("### Recent Sessions"));
    assert!(context.contains("shipped the auth middleware"));
    assert!(context.contains("### Recent User Prompts"));
    assert!(context.contains("please add auth"));
    assert!(context.contains("### Recent Observations"));
    assert!(context.contains("**Auth direction**"));
}

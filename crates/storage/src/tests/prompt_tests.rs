use engram_core::{AddPromptParams, EngramError};

use super::{seed_session, test_store};

fn prompt(session: &str, content: &str) -> AddPromptParams {
    AddPromptParams {
        session_id: session.to_owned(),
        content: content.to_owned(),
        project: Some("engram".to_owned()),
    }
}

#[test]
fn prompts_append_and_list_newest_first() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let first = store.add_prompt(&prompt("s1", "add JWT auth to the API")).unwrap();
    let second = store.add_prompt(&prompt("s1", "now write tests for it")).unwrap();
    assert!(second > first);

    let recent = store.recent_prompts(Some("engram"), 0).unwrap();
    assert_eq!(recent.len(), 2);

    assert!(store.recent_prompts(Some("unknown-project"), 0).unwrap().is_empty());
}

#[test]
fn prompt_search_uses_fts() {
    let (store, _dir) = test_store();
    seed_session(&store);

    store.add_prompt(&prompt("s1", "please refactor the tokenizer module")).unwrap();
    store.add_prompt(&prompt("s1", "deploy the staging environment")).unwrap();

    let hits = store.search_prompts("tokenizer", Some("engram"), 0).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].content.contains("tokenizer"));

    assert!(store.search_prompts("zzz-absent", None, 0).unwrap().is_empty());
    assert!(store.search_prompts("", None, 0).unwrap().is_empty());
}

#[test]
fn prompt_content_is_redacted_and_truncated() {
    let (store, _dir) = test_store();
    seed_session(&store);

    store.add_prompt(&prompt("s1", "use <private>hunter2</private> as the admin password")).unwrap();
    let recent = store.recent_prompts(None, 0).unwrap();
    assert!(!recent[0].content.contains("hunter2"));
    assert!(recent[0].content.contains("[REDACTED]"));

    let long = "p".repeat(2_500);
    store.add_prompt(&prompt("s1", &long)).unwrap();
    let recent = store.recent_prompts(None, 0).unwrap();
    assert!(recent[0].content.ends_with("... [truncated]"));
}

#[test]
fn prompt_validation() {
    let (store, _dir) = test_store();
    seed_session(&store);

    assert!(matches!(store.add_prompt(&prompt("", "content")), Err(EngramError::Validation(_))));
    assert!(matches!(store.add_prompt(&prompt("s1", "   ")), Err(EngramError::Validation(_))));
}

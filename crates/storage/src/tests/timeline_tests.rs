use engram_core::EngramError;

use super::{obs, seed_session, test_store};

#[test]
fn timeline_surrounds_focus_and_skips_deleted() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let first = store.add_observation(&obs("s1", "bugfix", "first", "first event")).unwrap();
    let middle = store.add_observation(&obs("s1", "bugfix", "middle", "to be deleted")).unwrap();
    let last = store.add_observation(&obs("s1", "bugfix", "last", "last event")).unwrap();

    store.delete_observation(middle, false).unwrap();

    let timeline = store.timeline(first, Some(5), Some(5)).unwrap();
    assert!(timeline.before.is_empty());
    assert_eq!(timeline.after.len(), 1);
    assert_eq!(timeline.after[0].id, last);
    assert_eq!(timeline.total_in_range, 2);

    let timeline = store.timeline(last, Some(5), Some(5)).unwrap();
    assert!(timeline.after.is_empty());
    assert_eq!(timeline.before.len(), 1);
    assert_eq!(timeline.before[0].id, first);
}

#[test]
fn timeline_before_entries_are_chronological() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let a = store.add_observation(&obs("s1", "manual", "a", "event a")).unwrap();
    let b = store.add_observation(&obs("s1", "manual", "b", "event b")).unwrap();
    let c = store.add_observation(&obs("s1", "manual", "c", "event c")).unwrap();

    let timeline = store.timeline(c, Some(5), Some(5)).unwrap();
    assert_eq!(timeline.before.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn timeline_defaults_and_bounds() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let focus = store.add_observation(&obs("s1", "manual", "focus", "the focus")).unwrap();
    for i in 0..8 {
        store.add_observation(&obs("s1", "manual", &format!("n{i}"), &format!("event {i}"))).unwrap();
    }

    // None defaults to 5 in each direction.
    let timeline = store.timeline(focus, None, None).unwrap();
    assert_eq!(timeline.after.len(), 5);

    assert!(matches!(
        store.timeline(focus, Some(0), None),
        Err(EngramError::Validation(_))
    ));
    assert!(matches!(
        store.timeline(focus, None, Some(-3)),
        Err(EngramError::Validation(_))
    ));
}

#[test]
fn timeline_includes_session_info() {
    let (store, _dir) = test_store();
    seed_session(&store);

    let id = store.add_observation(&obs("s1", "manual", "t", "c")).unwrap();
    let timeline = store.timeline(id, None, None).unwrap();

    let session = timeline.session_info.expect("session should resolve");
    assert_eq!(session.id, "s1");
    assert_eq!(session.project, "engram");
}

#[test]
fn timeline_of_missing_or_deleted_focus_is_not_found() {
    let (store, _dir) = test_store();
    seed_session(&store);

    assert!(matches!(store.timeline(9_999, None, None), Err(EngramError::NotFound(_))));

    let id = store.add_observation(&obs("s1", "manual", "t", "c")).unwrap();
    store.delete_observation(id, false).unwrap();
    assert!(matches!(store.timeline(id, None, None), Err(EngramError::NotFound(_))));
}

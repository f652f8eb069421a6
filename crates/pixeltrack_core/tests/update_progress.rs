use std::collections::BTreeMap;
use std::sync::Once;

use pixeltrack_core::{
    update, AppState, Effect, ImageVersion, Msg, ProgressUpdate, Route, TaskProgress, TaskState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

/// Drives a fresh state through a successful upload of `filename` so the
/// store holds one registered project and the route is `Progress`.
fn tracked_state(prefix: &str, filename: &str) -> AppState {
    let state = AppState::new();
    let (state, effects) = update(
        state,
        Msg::FileSelected {
            filename: Some(filename.to_string()),
        },
    );
    let attempt = match effects.as_slice() {
        [Effect::RequestUploadLink { attempt, .. }] => *attempt,
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::LinkReady {
            attempt,
            object_prefix: prefix.to_string(),
            upload_link: format!("https://s3/{prefix}"),
        },
    );
    let (state, _) = update(state, Msg::TransferDone { attempt });
    assert_eq!(state.route(), Route::Progress);
    state
}

fn progress_event(prefix: &str, state: TaskState, done: u64, total: u64) -> ProgressUpdate {
    ProgressUpdate {
        object_prefix: prefix.to_string(),
        state,
        progress: TaskProgress { done, total },
        versions: BTreeMap::new(),
    }
}

#[test]
fn progress_event_merges_into_matching_project() {
    init_logging();
    let state = tracked_state("p1", "cat.png");
    let event = progress_event("p1", TaskState::Progress, 3, 10);

    let (state, effects) = update(state, Msg::ProgressReceived(event));

    assert!(effects.is_empty());
    let project = state.projects().get("p1").unwrap();
    assert_eq!(project.state, Some(TaskState::Progress));
    assert_eq!(project.progress, Some(TaskProgress { done: 3, total: 10 }));
    assert_eq!(state.route(), Route::Progress);
}

#[test]
fn applying_the_same_event_twice_is_idempotent() {
    init_logging();
    let state = tracked_state("p1", "cat.png");
    let event = progress_event("p1", TaskState::Progress, 3, 10);

    let (once, _) = update(state, Msg::ProgressReceived(event.clone()));
    let mut expected = once.clone();
    expected.consume_dirty();
    let (mut twice, effects) = update(once, Msg::ProgressReceived(event));
    twice.consume_dirty();

    assert!(effects.is_empty());
    assert_eq!(twice, expected);
}

#[test]
fn unknown_prefix_leaves_store_unchanged() {
    init_logging();
    let state = tracked_state("p1", "cat.png");
    let before = state.projects().clone();

    let event = progress_event("unknown", TaskState::Progress, 5, 10);
    let (state, effects) = update(state, Msg::ProgressReceived(event));

    assert!(effects.is_empty());
    assert_eq!(state.projects(), &before);
    assert_eq!(state.route(), Route::Progress);
}

#[test]
fn success_event_merges_versions_and_navigates_to_result() {
    init_logging();
    let state = tracked_state("p1", "cat.png");
    let (state, _) = update(
        state,
        Msg::ProgressReceived(progress_event("p1", TaskState::Progress, 3, 10)),
    );

    let mut versions = BTreeMap::new();
    versions.insert(ImageVersion::Original, "u1".to_string());
    versions.insert(ImageVersion::Thumb, "u2".to_string());
    let event = ProgressUpdate {
        object_prefix: "p1".to_string(),
        state: TaskState::Success,
        progress: TaskProgress { done: 10, total: 10 },
        versions,
    };
    let (state, effects) = update(state, Msg::ProgressReceived(event));

    assert!(effects.is_empty());
    assert_eq!(state.route(), Route::Result);
    let view = state.view();
    let labels: Vec<&str> = view
        .version_links
        .iter()
        .map(|link| link.label)
        .collect();
    assert_eq!(labels, vec!["Original", "Thumb 150 x 120"]);
    let urls: Vec<&str> = view
        .version_links
        .iter()
        .map(|link| link.url.as_str())
        .collect();
    assert_eq!(urls, vec!["u1", "u2"]);
}

#[test]
fn incomplete_success_does_not_navigate() {
    init_logging();
    let state = tracked_state("p1", "cat.png");
    let event = progress_event("p1", TaskState::Success, 9, 10);

    let (state, _) = update(state, Msg::ProgressReceived(event));

    assert_eq!(state.route(), Route::Progress);
}

#[test]
fn terminal_navigation_fires_exactly_once() {
    init_logging();
    let mut state = tracked_state("p1", "cat.png");

    let mut transitions = 0;
    for _ in 0..3 {
        let before = state.route();
        let (next, effects) = update(
            state,
            Msg::ProgressReceived(progress_event("p1", TaskState::Success, 10, 10)),
        );
        assert!(effects.is_empty());
        if next.route() != before {
            transitions += 1;
        }
        state = next;
    }

    assert_eq!(transitions, 1);
    assert_eq!(state.route(), Route::Result);
}

#[test]
fn event_for_inactive_project_merges_without_navigation() {
    init_logging();
    // Two uploads; the second one is the active tracked session.
    let state = tracked_state("p1", "one.png");
    let (state, effects) = update(
        state,
        Msg::FileSelected {
            filename: Some("two.png".to_string()),
        },
    );
    let attempt = match effects.as_slice() {
        [Effect::RequestUploadLink { attempt, .. }] => *attempt,
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::LinkReady {
            attempt,
            object_prefix: "p2".to_string(),
            upload_link: "https://s3/p2".to_string(),
        },
    );
    let (state, _) = update(state, Msg::TransferDone { attempt });
    assert_eq!(state.active_prefix(), Some("p2"));

    let (state, effects) = update(
        state,
        Msg::ProgressReceived(progress_event("p1", TaskState::Success, 10, 10)),
    );

    assert!(effects.is_empty());
    assert_eq!(state.route(), Route::Progress);
    let inactive = state.projects().get("p1").unwrap();
    assert_eq!(inactive.state, Some(TaskState::Success));
}

#[test]
fn failure_event_surfaces_terminal_error_and_unsubscribes_once() {
    init_logging();
    let state = tracked_state("p1", "cat.png");

    let (state, effects) = update(
        state,
        Msg::ProgressReceived(progress_event("p1", TaskState::Failure, 4, 10)),
    );
    assert_eq!(
        effects,
        vec![Effect::Unsubscribe {
            object_prefix: "p1".to_string(),
        }]
    );
    assert_eq!(state.route(), Route::Progress);
    assert!(state.view().terminal_error.is_some());

    // A duplicate terminal event must not unsubscribe again.
    let (state, effects) = update(
        state,
        Msg::ProgressReceived(progress_event("p1", TaskState::Revoked, 4, 10)),
    );
    assert!(effects.is_empty());
    assert_eq!(state.route(), Route::Progress);
}

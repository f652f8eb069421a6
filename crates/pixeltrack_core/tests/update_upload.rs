use std::sync::Once;

use pixeltrack_core::{update, AppState, Effect, Msg, Route, UploadPhase};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

fn select_file(state: AppState, filename: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FileSelected {
            filename: Some(filename.to_string()),
        },
    )
}

#[test]
fn empty_selection_is_ignored() {
    init_logging();
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::FileSelected { filename: None });

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn file_selection_requests_upload_link() {
    init_logging();
    let (state, effects) = select_file(AppState::new(), "cat.png");

    assert_eq!(
        effects,
        vec![Effect::RequestUploadLink {
            attempt: 1,
            filename: "cat.png".to_string(),
        }]
    );
    let view = state.view();
    assert!(view.uploading);
    assert_eq!(view.route, Route::Home);
    assert_eq!(view.filename.as_deref(), Some("cat.png"));
    assert_eq!(view.project_count, 0);
}

#[test]
fn link_reply_appends_project_and_starts_transfer() {
    init_logging();
    let (state, _) = select_file(AppState::new(), "cat.png");
    let (state, effects) = update(
        state,
        Msg::LinkReady {
            attempt: 1,
            object_prefix: "p1".to_string(),
            upload_link: "https://s3/x".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::TransferBytes {
            attempt: 1,
            upload_link: "https://s3/x".to_string(),
        }]
    );
    let project = state.projects().get("p1").expect("project appended");
    assert_eq!(project.filename, "cat.png");
    assert_eq!(project.upload_link, "https://s3/x");
    assert!(project.state.is_none());
}

#[test]
fn transfer_success_registers_and_navigates_to_progress() {
    init_logging();
    let (state, _) = select_file(AppState::new(), "cat.png");
    let (state, _) = update(
        state,
        Msg::LinkReady {
            attempt: 1,
            object_prefix: "p1".to_string(),
            upload_link: "https://s3/x".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::TransferDone { attempt: 1 });

    assert_eq!(
        effects,
        vec![Effect::Subscribe {
            object_prefix: "p1".to_string(),
        }]
    );
    assert_eq!(state.route(), Route::Progress);
    assert_eq!(state.active_prefix(), Some("p1"));
    let view = state.view();
    assert_eq!(view.project_count, 1);
    assert_eq!(view.filename.as_deref(), Some("cat.png"));
    assert!(!view.uploading);
}

#[test]
fn link_failure_surfaces_error_without_project() {
    init_logging();
    let (state, _) = select_file(AppState::new(), "cat.png");
    let (state, effects) = update(
        state,
        Msg::LinkFailed {
            attempt: 1,
            error: "could not request new upload url".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.projects().is_empty());
    assert_eq!(state.route(), Route::Home);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("could not request new upload url")
    );
    assert!(matches!(
        state.upload(),
        UploadPhase::Failed { attempt: 1, .. }
    ));
}

#[test]
fn transfer_failure_surfaces_error_and_stops() {
    init_logging();
    let (state, _) = select_file(AppState::new(), "cat.png");
    let (state, _) = update(
        state,
        Msg::LinkReady {
            attempt: 1,
            object_prefix: "p1".to_string(),
            upload_link: "https://s3/x".to_string(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::TransferFailed {
            attempt: 1,
            error: "could not upload file".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.route(), Route::Home);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("could not upload file")
    );
    // No subscription, no navigation; recovery is a fresh selection.
    assert!(state.active_prefix().is_none());
}

#[test]
fn stale_reply_for_superseded_attempt_is_dropped() {
    init_logging();
    let (state, _) = select_file(AppState::new(), "first.png");
    let (state, _) = select_file(state, "second.png");

    // Reply for the abandoned first attempt arrives late.
    let (state, effects) = update(
        state,
        Msg::LinkReady {
            attempt: 1,
            object_prefix: "p1".to_string(),
            upload_link: "https://s3/x".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.projects().is_empty());
    assert_eq!(state.view().filename.as_deref(), Some("second.png"));
}

#[test]
fn reused_prefix_overwrites_instead_of_duplicating() {
    init_logging();
    let mut state = AppState::new();
    for filename in ["one.png", "two.png"] {
        let (next, effects) = select_file(state, filename);
        let attempt = match effects.as_slice() {
            [Effect::RequestUploadLink { attempt, .. }] => *attempt,
            other => panic!("unexpected effects {other:?}"),
        };
        let (next, _) = update(
            next,
            Msg::LinkReady {
                attempt,
                object_prefix: "p1".to_string(),
                upload_link: "https://s3/x".to_string(),
            },
        );
        let (next, _) = update(next, Msg::TransferDone { attempt });
        state = next;
    }

    assert_eq!(state.projects().len(), 1);
    assert_eq!(
        state.projects().get("p1").unwrap().filename,
        "two.png"
    );
}

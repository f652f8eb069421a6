use crate::project::Project;
use crate::state::{Route, UploadPhase};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected { filename } => {
            let Some(filename) = filename else {
                // Empty selection: log and stay put, nothing to propagate.
                log::warn!("file selection event without a file, ignoring");
                return (state, Vec::new());
            };
            let attempt = state.begin_attempt(filename.clone());
            vec![Effect::RequestUploadLink { attempt, filename }]
        }
        Msg::LinkReady {
            attempt,
            object_prefix,
            upload_link,
        } => {
            let UploadPhase::RequestingLink {
                attempt: current,
                filename,
            } = state.upload().clone()
            else {
                log::debug!("link reply outside RequestingLink phase, dropped");
                return (state, Vec::new());
            };
            if current != attempt {
                log::debug!("stale link reply for attempt {attempt}, dropped");
                return (state, Vec::new());
            }
            // The project record exists from the moment authorization
            // arrives; progress events may only target a known prefix.
            state.projects_mut().append(Project::new(
                object_prefix.clone(),
                filename.clone(),
                upload_link.clone(),
            ));
            state.set_upload(UploadPhase::Uploading {
                attempt,
                filename,
                object_prefix,
                upload_link: upload_link.clone(),
            });
            vec![Effect::TransferBytes {
                attempt,
                upload_link,
            }]
        }
        Msg::LinkFailed { attempt, error } => {
            if !phase_matches(state.upload(), attempt) {
                log::debug!("stale link failure for attempt {attempt}, dropped");
                return (state, Vec::new());
            }
            log::error!("upload authorization failed: {error}");
            state.fail_attempt(attempt, error);
            Vec::new()
        }
        Msg::TransferDone { attempt } => {
            let UploadPhase::Uploading {
                attempt: current,
                object_prefix,
                ..
            } = state.upload().clone()
            else {
                log::debug!("transfer reply outside Uploading phase, dropped");
                return (state, Vec::new());
            };
            if current != attempt {
                log::debug!("stale transfer reply for attempt {attempt}, dropped");
                return (state, Vec::new());
            }
            state.set_upload(UploadPhase::Registered {
                attempt,
                object_prefix: object_prefix.clone(),
            });
            state.set_active_prefix(Some(object_prefix.clone()));
            state.set_terminal_error(None);
            state.navigate(Route::Progress);
            vec![Effect::Subscribe { object_prefix }]
        }
        Msg::TransferFailed { attempt, error } => {
            if !phase_matches(state.upload(), attempt) {
                log::debug!("stale transfer failure for attempt {attempt}, dropped");
                return (state, Vec::new());
            }
            log::error!("byte transfer failed: {error}");
            // The issued upload link is one-shot; recovery is a fresh
            // file selection from Home.
            state.fail_attempt(attempt, error);
            Vec::new()
        }
        Msg::ProgressReceived(progress) => {
            state.projects_mut().merge_by_prefix(&progress);

            let is_active = state.active_prefix() == Some(progress.object_prefix.as_str());
            if !is_active {
                return (state, Vec::new());
            }

            if progress.state.is_terminal_failure() {
                // Stay on the progress view, surface the failure and let
                // the back action return Home. The server will not send
                // further events for a dead task.
                if state.terminal_error().is_none() {
                    state.set_terminal_error(Some(format!(
                        "processing ended in {:?}",
                        progress.state
                    )));
                    return (
                        state,
                        vec![Effect::Unsubscribe {
                            object_prefix: progress.object_prefix,
                        }],
                    );
                }
                return (state, Vec::new());
            }

            if progress.progress.is_complete()
                && progress.state == crate::TaskState::Success
                && state.route() == Route::Progress
            {
                state.navigate(Route::Result);
            }
            Vec::new()
        }
        Msg::CancelClicked => {
            if state.route() != Route::Progress {
                return (state, Vec::new());
            }
            let effects = state
                .active_prefix()
                .map(|prefix| {
                    vec![Effect::Unsubscribe {
                        object_prefix: prefix.to_string(),
                    }]
                })
                .unwrap_or_default();
            state.set_active_prefix(None);
            state.set_terminal_error(None);
            state.set_upload(UploadPhase::Idle);
            state.navigate(Route::Home);
            effects
        }
        Msg::BackPressed => {
            match state.route() {
                // Mid-transfer the progress view is locked; re-assert the
                // current route instead of leaving it.
                Route::Progress if state.terminal_error().is_none() => {}
                Route::Progress => state.navigate(Route::Home),
                // Once terminal, the progress step is never revisited.
                Route::Result => state.navigate(Route::Home),
                Route::Home => {}
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn phase_matches(phase: &UploadPhase, attempt: crate::AttemptId) -> bool {
    match phase {
        UploadPhase::RequestingLink { attempt: a, .. }
        | UploadPhase::Uploading { attempt: a, .. } => *a == attempt,
        _ => false,
    }
}

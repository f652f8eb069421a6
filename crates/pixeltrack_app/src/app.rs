use std::time::Duration;

use anyhow::bail;
use pixeltrack_core::{update, AppState, Msg, Route, UploadPhase};
use pixeltrack_engine::EngineSettings;

use crate::effects::EffectRunner;
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Drives the core state machine against the engine until the tracked
/// project reaches a terminal view.
pub fn run(
    filename: Option<String>,
    payload: Vec<u8>,
    base_url: &str,
    ws_url: &str,
) -> anyhow::Result<()> {
    let runner = EffectRunner::new(EngineSettings::new(base_url, ws_url), payload)?;

    let mut state = AppState::new();
    let (next, effects) = update(state, Msg::FileSelected { filename });
    state = next;
    if effects.is_empty() {
        bail!("no file selected");
    }
    runner.run(effects);

    loop {
        let mut handled = false;
        while let Some(msg) = runner.poll() {
            handled = true;
            let (next, effects) = update(std::mem::take(&mut state), msg);
            state = next;
            runner.run(effects);
        }

        if state.consume_dirty() {
            render::render(&state.view());
        }

        if state.route() == Route::Result {
            return Ok(());
        }
        if let UploadPhase::Failed { error, .. } = state.upload() {
            bail!("upload failed: {error}");
        }
        if let Some(error) = state.terminal_error() {
            bail!("processing failed: {error}");
        }

        if !handled {
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

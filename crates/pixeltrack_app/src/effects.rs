use std::collections::BTreeMap;

use client_logging::{client_info, client_warn};
use pixeltrack_core::{Effect, ImageVersion, Msg, ProgressUpdate, TaskProgress, TaskState};
use pixeltrack_engine::{ApiError, ChannelEvent, EngineEvent, EngineHandle, EngineSettings};

/// Executes core effects against the engine and maps engine events back to
/// core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    /// The file bytes for the current run; handed to the engine when the
    /// transfer effect fires.
    payload: Vec<u8>,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, payload: Vec<u8>) -> Result<Self, ApiError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
            payload,
        })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestUploadLink { attempt, filename } => {
                    client_info!("requesting upload link for {filename} (attempt {attempt})");
                    self.engine.request_link(attempt, filename);
                }
                Effect::TransferBytes {
                    attempt,
                    upload_link,
                } => {
                    client_info!(
                        "transferring {} bytes (attempt {attempt})",
                        self.payload.len()
                    );
                    self.engine
                        .transfer(attempt, upload_link, self.payload.clone());
                }
                Effect::Subscribe { object_prefix } => self.engine.subscribe(object_prefix),
                Effect::Unsubscribe { object_prefix } => self.engine.unsubscribe(object_prefix),
            }
        }
    }

    /// Next message for the core, if any engine event is pending.
    pub fn poll(&self) -> Option<Msg> {
        while let Some(event) = self.engine.try_recv() {
            if let Some(msg) = map_event(event) {
                return Some(msg);
            }
        }
        None
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::LinkReady { attempt, project } => Some(Msg::LinkReady {
            attempt,
            object_prefix: project.object_prefix,
            upload_link: project.upload_link,
        }),
        EngineEvent::LinkFailed { attempt, error } => Some(Msg::LinkFailed {
            attempt,
            error: error.to_string(),
        }),
        EngineEvent::TransferDone { attempt } => Some(Msg::TransferDone { attempt }),
        EngineEvent::TransferFailed { attempt, error } => Some(Msg::TransferFailed {
            attempt,
            error: error.to_string(),
        }),
        EngineEvent::Channel(ChannelEvent::Progress(event)) => {
            Some(Msg::ProgressReceived(map_progress(event)))
        }
        EngineEvent::Channel(ChannelEvent::Ready) => {
            client_info!("subscription channel ready");
            None
        }
        EngineEvent::Channel(ChannelEvent::Down) => {
            client_warn!("subscription channel down, reconnecting");
            None
        }
        EngineEvent::Channel(ChannelEvent::AckRejected(ack)) => {
            client_warn!(
                "server refused {:?} for {}: {} {}",
                ack.action,
                ack.object_prefix,
                ack.status_code,
                ack.status
            );
            None
        }
    }
}

fn map_progress(event: pixeltrack_engine::ProgressEvent) -> ProgressUpdate {
    let versions: BTreeMap<ImageVersion, String> = event
        .versions
        .into_iter()
        .map(|(version, url)| (map_version(version), url))
        .collect();
    ProgressUpdate {
        object_prefix: event.object_prefix,
        state: map_state(event.state),
        progress: TaskProgress {
            done: event.progress.done,
            total: event.progress.total,
        },
        versions,
    }
}

fn map_state(state: pixeltrack_engine::TaskState) -> TaskState {
    match state {
        pixeltrack_engine::TaskState::ExpectingOriginal => TaskState::ExpectingOriginal,
        pixeltrack_engine::TaskState::GotOriginal => TaskState::GotOriginal,
        pixeltrack_engine::TaskState::Started => TaskState::Started,
        pixeltrack_engine::TaskState::Progress => TaskState::Progress,
        pixeltrack_engine::TaskState::Success => TaskState::Success,
        pixeltrack_engine::TaskState::Failure => TaskState::Failure,
        pixeltrack_engine::TaskState::Revoked => TaskState::Revoked,
    }
}

fn map_version(version: pixeltrack_engine::ImageVersion) -> ImageVersion {
    match version {
        pixeltrack_engine::ImageVersion::Original => ImageVersion::Original,
        pixeltrack_engine::ImageVersion::Thumb => ImageVersion::Thumb,
        pixeltrack_engine::ImageVersion::BigThumb => ImageVersion::BigThumb,
        pixeltrack_engine::ImageVersion::Big1920 => ImageVersion::Big1920,
        pixeltrack_engine::ImageVersion::D2500 => ImageVersion::D2500,
    }
}

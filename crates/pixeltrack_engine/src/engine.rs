use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::api::{ApiError, ReqwestUploadApi, UploadApi, UploadSettings};
use crate::channel::{ChannelSettings, EventSink, SubscriptionChannel};
use crate::types::{AttemptId, ChannelEvent, EngineEvent};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Base URL of the HTTP API, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// WebSocket endpoint, e.g. `ws://localhost:8000/ws`.
    pub ws_url: String,
    pub upload: UploadSettings,
}

impl EngineSettings {
    pub fn new(base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: ws_url.into(),
            upload: UploadSettings::default(),
        }
    }
}

enum EngineCommand {
    RequestLink {
        attempt: AttemptId,
        filename: String,
    },
    Transfer {
        attempt: AttemptId,
        upload_link: String,
        bytes: Vec<u8>,
    },
    Subscribe {
        object_prefix: String,
    },
    Unsubscribe {
        object_prefix: String,
    },
}

/// Forwards channel events into the engine's event stream.
struct ForwardingSink {
    event_tx: mpsc::Sender<EngineEvent>,
}

impl EventSink for ForwardingSink {
    fn emit(&self, event: ChannelEvent) {
        let _ = self.event_tx.send(EngineEvent::Channel(event));
    }
}

/// Runs the HTTP client and the subscription channel on a dedicated thread
/// hosting a tokio runtime. The app sends commands and polls events over
/// plain mpsc channels; dropping the handle tears everything down, closing
/// the socket on the way out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ApiError> {
        let api = Arc::new(ReqwestUploadApi::new(&settings.base_url, settings.upload.clone())?);
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
        let channel_settings = ChannelSettings::new(settings.ws_url.clone());

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let _enter = runtime.enter();

            let channel = SubscriptionChannel::spawn(
                channel_settings,
                Arc::new(ForwardingSink {
                    event_tx: event_tx.clone(),
                }),
            );
            let guard = channel.attach();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::RequestLink { attempt, filename } => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let event = match api.create_project(&filename).await {
                                Ok(project) => EngineEvent::LinkReady { attempt, project },
                                Err(error) => EngineEvent::LinkFailed { attempt, error },
                            };
                            let _ = event_tx.send(event);
                        });
                    }
                    EngineCommand::Transfer {
                        attempt,
                        upload_link,
                        bytes,
                    } => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let event = match api.put_object(&upload_link, bytes).await {
                                Ok(()) => EngineEvent::TransferDone { attempt },
                                Err(error) => EngineEvent::TransferFailed { attempt, error },
                            };
                            let _ = event_tx.send(event);
                        });
                    }
                    EngineCommand::Subscribe { object_prefix } => guard.subscribe(object_prefix),
                    EngineCommand::Unsubscribe { object_prefix } => {
                        guard.unsubscribe(object_prefix)
                    }
                }
            }

            // Last guard gone: wait for the channel task so queued control
            // frames and the close frame hit the wire before the runtime
            // goes away. Bounded in case the peer has stopped reading.
            drop(guard);
            let _ = runtime.block_on(async {
                tokio::time::timeout(Duration::from_secs(1), channel.join()).await
            });
            runtime.shutdown_timeout(Duration::from_millis(250));
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn request_link(&self, attempt: AttemptId, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::RequestLink {
            attempt,
            filename: filename.into(),
        });
    }

    pub fn transfer(&self, attempt: AttemptId, upload_link: impl Into<String>, bytes: Vec<u8>) {
        let _ = self.cmd_tx.send(EngineCommand::Transfer {
            attempt,
            upload_link: upload_link.into(),
            bytes,
        });
    }

    pub fn subscribe(&self, object_prefix: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Subscribe {
            object_prefix: object_prefix.into(),
        });
    }

    pub fn unsubscribe(&self, object_prefix: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Unsubscribe {
            object_prefix: object_prefix.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

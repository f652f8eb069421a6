//! Pixeltrack engine: IO and effect execution for the tracking client.
mod api;
mod channel;
mod engine;
mod schema;
mod types;

pub use api::{ApiError, ApiFailure, ProjectCreated, ReqwestUploadApi, UploadApi, UploadSettings};
pub use channel::{ChannelGuard, ChannelSettings, EventSink, SubscriptionChannel};
pub use engine::{EngineHandle, EngineSettings};
pub use schema::{
    classify, ControlAction, ControlMessage, ImageVersion, ProgressEvent, SubscriptionAck,
    TaskState, WireProgress, WsInbound,
};
pub use types::{AttemptId, ChannelEvent, EngineEvent};

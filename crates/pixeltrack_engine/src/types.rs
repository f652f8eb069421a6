use crate::api::{ApiError, ProjectCreated};
use crate::schema::{ProgressEvent, SubscriptionAck};

/// Identifier the app assigns to one upload attempt; echoed back in every
/// reply so stale replies can be matched and dropped.
pub type AttemptId = u64;

/// Everything the subscription channel reports upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Socket open, desired subscriptions replayed.
    Ready,
    /// Socket lost; a reconnect with backoff is underway.
    Down,
    /// A validated progress frame.
    Progress(ProgressEvent),
    /// The server refused a control frame.
    AckRejected(SubscriptionAck),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    LinkReady {
        attempt: AttemptId,
        project: ProjectCreated,
    },
    LinkFailed {
        attempt: AttemptId,
        error: ApiError,
    },
    TransferDone {
        attempt: AttemptId,
    },
    TransferFailed {
        attempt: AttemptId,
        error: ApiError,
    },
    Channel(ChannelEvent),
}

//! Wire message shapes for the `/ws` subscription protocol and the total
//! validation that narrows an arbitrary inbound frame to a trusted schema.
//!
//! Validation is the sole defense against a misbehaving or version-skewed
//! server: anything structurally off classifies as `Unrecognized` and is
//! dropped before it can touch state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Control verbs sent by the client and echoed back in acks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlAction {
    Subscribe,
    Unsubscribe,
}

/// Outbound control frame, keyed by the project's object prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlMessage {
    pub action: ControlAction,
    pub object_prefix: String,
}

/// Server acknowledgment of a control frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionAck {
    pub action: ControlAction,
    pub object_prefix: String,
    pub status_code: u16,
    pub status: String,
    pub message: Option<String>,
}

/// Server-side task lifecycle tags, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    ExpectingOriginal,
    GotOriginal,
    Started,
    Progress,
    Success,
    Failure,
    Revoked,
}

/// The fixed, closed set of derived image versions. A versions map with any
/// key outside this set fails deserialization, which rejects the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVersion {
    Original,
    Thumb,
    BigThumb,
    #[serde(rename = "big_1920")]
    Big1920,
    D2500,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WireProgress {
    pub done: u64,
    pub total: u64,
}

/// Inbound progress frame for one project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressEvent {
    pub object_prefix: String,
    pub state: TaskState,
    pub versions: BTreeMap<ImageVersion, String>,
    pub progress: WireProgress,
}

/// Classification of one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsInbound {
    Ack(SubscriptionAck),
    Progress(ProgressEvent),
    Unrecognized,
}

/// Narrows a raw text frame to one of the two trusted schemas. Total: never
/// panics, never partially trusts a frame.
pub fn classify(raw: &str) -> WsInbound {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return WsInbound::Unrecognized;
    };
    // Acks carry an `action` field, progress frames never do.
    if value.get("action").is_some() {
        match serde_json::from_value::<SubscriptionAck>(value) {
            Ok(ack) => WsInbound::Ack(ack),
            Err(err) => {
                log::debug!("malformed ack frame dropped: {err}");
                WsInbound::Unrecognized
            }
        }
    } else {
        match serde_json::from_value::<ProgressEvent>(value) {
            Ok(event) => WsInbound::Progress(event),
            Err(err) => {
                log::debug!("malformed progress frame dropped: {err}");
                WsInbound::Unrecognized
            }
        }
    }
}

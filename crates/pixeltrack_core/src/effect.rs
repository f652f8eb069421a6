use crate::AttemptId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the server for an object prefix and a one-shot upload link.
    RequestUploadLink {
        attempt: AttemptId,
        filename: String,
    },
    /// Push the file bytes to object storage via the issued link.
    TransferBytes {
        attempt: AttemptId,
        upload_link: String,
    },
    /// Start watching progress events for a project.
    Subscribe { object_prefix: String },
    /// Stop watching progress events for a project.
    Unsubscribe { object_prefix: String },
}

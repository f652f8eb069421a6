use crate::project::ProgressUpdate;
use crate::AttemptId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file for upload. `None` models an empty selection
    /// (dropped nothing, dialog dismissed); it is logged and ignored.
    FileSelected { filename: Option<String> },
    /// Upload authorization arrived for an attempt.
    LinkReady {
        attempt: AttemptId,
        object_prefix: String,
        upload_link: String,
    },
    /// Upload authorization was refused.
    LinkFailed { attempt: AttemptId, error: String },
    /// Byte transfer to object storage finished.
    TransferDone { attempt: AttemptId },
    /// Byte transfer to object storage failed.
    TransferFailed { attempt: AttemptId, error: String },
    /// A validated progress event from the subscription channel.
    ProgressReceived(ProgressUpdate),
    /// User clicked Cancel on the progress view.
    CancelClicked,
    /// Browser/host back action.
    BackPressed,
    /// Fallback for placeholder wiring.
    NoOp,
}

//! Pixeltrack core: pure upload/processing-tracking state machine.
mod effect;
mod msg;
mod project;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use project::{
    ImageVersion, ProgressUpdate, Project, ProjectStore, TaskProgress, TaskState,
};
pub use state::{AppState, AttemptId, Route, UploadPhase};
pub use update::update;
pub use view_model::{ellipsize_filename, AppViewModel, VersionLink};

use crate::project::{Project, ProjectStore};
use crate::view_model::{build_view, AppViewModel};

/// Identifier for one upload attempt. Network replies carry it back so a
/// stale reply for an abandoned attempt can be recognized and dropped.
pub type AttemptId = u64;

/// Client-visible views. Route transitions are one-way while a transfer is
/// being tracked; see `update` for the back-navigation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Progress,
    Result,
}

/// Per-attempt upload state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    RequestingLink {
        attempt: AttemptId,
        filename: String,
    },
    Uploading {
        attempt: AttemptId,
        filename: String,
        object_prefix: String,
        upload_link: String,
    },
    Registered {
        attempt: AttemptId,
        object_prefix: String,
    },
    Failed {
        attempt: AttemptId,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    projects: ProjectStore,
    upload: UploadPhase,
    route: Route,
    /// Prefix of the project currently tracked in the UI. Explicit rather
    /// than "last appended" so concurrent uploads cannot collide.
    active_prefix: Option<String>,
    /// Set when the active project reached FAILURE/REVOKED. Unlocks the
    /// back action on the progress view.
    terminal_error: Option<String>,
    last_error: Option<String>,
    next_attempt: AttemptId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        build_view(self)
    }

    /// Returns the dirty flag and clears it. The host renders when true.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn upload(&self) -> &UploadPhase {
        &self.upload
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    pub fn active_prefix(&self) -> Option<&str> {
        self.active_prefix.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn terminal_error(&self) -> Option<&str> {
        self.terminal_error.as_deref()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_attempt(&mut self, filename: String) -> AttemptId {
        self.next_attempt += 1;
        let attempt = self.next_attempt;
        self.upload = UploadPhase::RequestingLink { attempt, filename };
        self.last_error = None;
        self.mark_dirty();
        attempt
    }

    pub(crate) fn set_upload(&mut self, phase: UploadPhase) {
        self.upload = phase;
        self.mark_dirty();
    }

    pub(crate) fn fail_attempt(&mut self, attempt: AttemptId, error: String) {
        self.last_error = Some(error.clone());
        self.upload = UploadPhase::Failed { attempt, error };
        self.mark_dirty();
    }

    pub(crate) fn projects_mut(&mut self) -> &mut ProjectStore {
        self.mark_dirty();
        &mut self.projects
    }

    pub(crate) fn set_active_prefix(&mut self, prefix: Option<String>) {
        self.active_prefix = prefix;
        self.mark_dirty();
    }

    pub(crate) fn set_terminal_error(&mut self, error: Option<String>) {
        self.terminal_error = error;
        self.mark_dirty();
    }

    /// Route change; navigating to the current route is a no-op, which is
    /// what makes the terminal transition naturally fire at most once.
    pub(crate) fn navigate(&mut self, route: Route) {
        if self.route != route {
            self.route = route;
            self.mark_dirty();
        }
    }

    /// The project the UI is currently tracking, if registered.
    pub fn active_project(&self) -> Option<&Project> {
        self.active_prefix
            .as_deref()
            .and_then(|prefix| self.projects.get(prefix))
    }
}

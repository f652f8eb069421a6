use std::collections::BTreeMap;

/// Server-side lifecycle of one processing task, consumed as opaque tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    ExpectingOriginal,
    GotOriginal,
    Started,
    Progress,
    Success,
    Failure,
    Revoked,
}

impl TaskState {
    /// FAILURE and REVOKED both end a task without producing results.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, TaskState::Failure | TaskState::Revoked)
    }
}

/// The closed set of derived versions the server produces per image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImageVersion {
    Original,
    Thumb,
    BigThumb,
    Big1920,
    D2500,
}

impl ImageVersion {
    /// Human-readable label for the result view.
    pub fn display_name(self) -> &'static str {
        match self {
            ImageVersion::Original => "Original",
            ImageVersion::Thumb => "Thumb 150 x 120",
            ImageVersion::BigThumb => "BigThumb 700 x 700",
            ImageVersion::Big1920 => "Big 1920 x 1080",
            ImageVersion::D2500 => "2500 x 2500",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskProgress {
    pub done: u64,
    pub total: u64,
}

impl TaskProgress {
    pub fn is_complete(self) -> bool {
        self.done == self.total
    }
}

/// One upload-to-result lifecycle. `object_prefix` is the stable join key
/// between the store and inbound progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub object_prefix: String,
    pub filename: String,
    /// One-shot authorization token, consumed by the byte transfer.
    pub upload_link: String,
    pub state: Option<TaskState>,
    pub progress: Option<TaskProgress>,
    pub versions: BTreeMap<ImageVersion, String>,
}

impl Project {
    pub fn new(
        object_prefix: impl Into<String>,
        filename: impl Into<String>,
        upload_link: impl Into<String>,
    ) -> Self {
        Self {
            object_prefix: object_prefix.into(),
            filename: filename.into(),
            upload_link: upload_link.into(),
            state: None,
            progress: None,
            versions: BTreeMap::new(),
        }
    }
}

/// A validated progress event, ready to merge into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub object_prefix: String,
    pub state: TaskState,
    pub progress: TaskProgress,
    pub versions: BTreeMap<ImageVersion, String>,
}

/// Insertion-ordered collection of projects, at most one per `object_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectStore {
    records: Vec<Project>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a project. A record with the same `object_prefix` is replaced
    /// in place instead of duplicated, so the prefix stays a unique key.
    pub fn append(&mut self, project: Project) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|record| record.object_prefix == project.object_prefix)
        {
            log::warn!(
                "replacing existing project for object_prefix={}",
                project.object_prefix
            );
            *existing = project;
        } else {
            self.records.push(project);
        }
    }

    /// Shallow-merges `update` over every record matching its prefix.
    /// An unknown prefix leaves the store unchanged; this is not an error,
    /// events may in principle race against store population.
    pub fn merge_by_prefix(&mut self, update: &ProgressUpdate) {
        for record in &mut self.records {
            if record.object_prefix == update.object_prefix {
                record.state = Some(update.state);
                record.progress = Some(update.progress);
                record.versions = update.versions.clone();
            }
        }
    }

    pub fn get(&self, object_prefix: &str) -> Option<&Project> {
        self.records
            .iter()
            .find(|record| record.object_prefix == object_prefix)
    }

    /// Most recently appended project, if any.
    pub fn latest(&self) -> Option<&Project> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.records.iter()
    }
}

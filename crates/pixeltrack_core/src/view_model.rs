use crate::project::TaskProgress;
use crate::state::{AppState, Route, UploadPhase};

/// Filenames longer than this are shown middle-ellipsized, keeping the
/// first 16 and last 10 characters.
const FILENAME_DISPLAY_LIMIT: usize = 26;
const FILENAME_HEAD: usize = 16;
const FILENAME_TAIL: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLink {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    /// True while an attempt is between link request and transfer completion.
    pub uploading: bool,
    pub filename: Option<String>,
    /// `filename` shortened for display.
    pub display_filename: Option<String>,
    pub progress: Option<TaskProgress>,
    pub version_links: Vec<VersionLink>,
    pub last_error: Option<String>,
    pub terminal_error: Option<String>,
    pub project_count: usize,
}

pub(crate) fn build_view(state: &AppState) -> AppViewModel {
    let filename = match state.upload() {
        UploadPhase::RequestingLink { filename, .. } | UploadPhase::Uploading { filename, .. } => {
            Some(filename.clone())
        }
        _ => state
            .active_project()
            .map(|project| project.filename.clone()),
    };

    let active = state.active_project();
    let version_links = active
        .map(|project| {
            project
                .versions
                .iter()
                .map(|(version, url)| VersionLink {
                    label: version.display_name(),
                    url: url.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    AppViewModel {
        route: state.route(),
        uploading: matches!(
            state.upload(),
            UploadPhase::RequestingLink { .. } | UploadPhase::Uploading { .. }
        ),
        display_filename: filename.as_deref().map(ellipsize_filename),
        filename,
        progress: active.and_then(|project| project.progress),
        version_links,
        last_error: state.last_error().map(ToOwned::to_owned),
        terminal_error: state.terminal_error().map(ToOwned::to_owned),
        project_count: state.projects().len(),
    }
}

/// Middle-ellipsis for long filenames, e.g. `a-very-long-file ... name.png`.
pub fn ellipsize_filename(filename: &str) -> String {
    let chars: Vec<char> = filename.chars().collect();
    if chars.len() <= FILENAME_DISPLAY_LIMIT {
        return filename.to_string();
    }
    let head: String = chars[..FILENAME_HEAD].iter().collect();
    let tail: String = chars[chars.len() - FILENAME_TAIL..].iter().collect();
    format!("{head} ... {tail}")
}

#[cfg(test)]
mod tests {
    use super::ellipsize_filename;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(ellipsize_filename("cat.png"), "cat.png");
    }

    #[test]
    fn boundary_length_untouched() {
        let name = "a".repeat(26);
        assert_eq!(ellipsize_filename(&name), name);
    }

    #[test]
    fn long_names_keep_head_and_tail() {
        let name = "holiday-photos-barcelona-2024-final.png";
        let shown = ellipsize_filename(name);
        assert_eq!(shown, "holiday-photos-b ... -final.png");
    }
}

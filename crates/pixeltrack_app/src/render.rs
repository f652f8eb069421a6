use pixeltrack_core::{AppViewModel, Route};

const BAR_WIDTH: usize = 30;

/// Prints the current view to stdout. Each dirty state change produces one
/// line, standing in for the excluded screen layer.
pub fn render(view: &AppViewModel) {
    match view.route {
        Route::Home => {
            if let Some(error) = &view.last_error {
                println!("error: {error}");
            } else if view.uploading {
                let name = view.display_filename.as_deref().unwrap_or("file");
                println!("uploading {name} ...");
            }
        }
        Route::Progress => {
            let name = view.display_filename.as_deref().unwrap_or("file");
            if let Some(error) = &view.terminal_error {
                println!("processing {name} failed: {error}");
            } else {
                let (done, total) = view
                    .progress
                    .map(|progress| (progress.done, progress.total))
                    .unwrap_or((0, 0));
                println!("processing {name} {}", bar(done, total));
            }
        }
        Route::Result => {
            let name = view.filename.as_deref().unwrap_or("file");
            println!("{name} is ready:");
            for link in &view.version_links {
                println!("  {:<20} {}", link.label, link.url);
            }
        }
    }
}

fn bar(done: u64, total: u64) -> String {
    // Counts come off the wire, so cap at total and widen the multiply.
    let filled = if total == 0 {
        0
    } else {
        ((done.min(total) as u128 * BAR_WIDTH as u128) / total as u128) as usize
    };
    format!(
        "[{}{}] {done}/{total}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

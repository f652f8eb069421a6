mod app;
mod effects;
mod render;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use client_logging::LogDestination;

/// Upload an image and track its server-side processing until the derived
/// versions are ready.
#[derive(Parser)]
#[command(name = "pixeltrack")]
struct Cli {
    /// Image file to upload.
    image: PathBuf,

    /// Base URL of the processing service.
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Write logs to ./pixeltrack.log instead of the terminal.
    #[arg(long)]
    log_file: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let destination = if cli.log_file {
        LogDestination::File
    } else {
        LogDestination::Terminal
    };
    client_logging::initialize(destination, log::LevelFilter::Info);

    let filename = cli
        .image
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned);
    let payload = std::fs::read(&cli.image)
        .with_context(|| format!("reading {}", cli.image.display()))?;
    let ws_url = ws_url_for(&cli.server)?;

    app::run(filename, payload, &cli.server, &ws_url)
}

/// Derives the `/ws` endpoint from the HTTP base URL.
fn ws_url_for(base_url: &str) -> anyhow::Result<String> {
    let trimmed = base_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("http://") {
        Ok(format!("ws://{rest}/ws"))
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        Ok(format!("wss://{rest}/ws"))
    } else {
        bail!("server url must start with http:// or https://, got {base_url}");
    }
}

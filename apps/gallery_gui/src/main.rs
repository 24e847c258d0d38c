use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

mod backend_bridge;
mod controller;
mod media;
mod ui;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{load_settings, ImageSearchApi, ImageSearchClient, MissingImageSearchApi};
use crossbeam_channel::bounded;
use eframe::egui;
use shared::error::SearchError;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::{GalleryApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(about = "Desktop image gallery backed by Unsplash photo search")]
struct Args {
    /// Settings file; defaults to ./gallery.toml or the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search to run as soon as the window opens.
    #[arg(long)]
    query: Option<String>,
}

/// Builds the live client, or a stand-in that reports why it could not be
/// built so the window can still open and show the problem.
fn build_search_api(config_path: Option<&Path>) -> (Arc<dyn ImageSearchApi>, Option<SearchError>) {
    let client = load_settings(config_path)
        .map_err(|err| SearchError::validation(err.to_string()))
        .and_then(|settings| settings.client_config())
        .and_then(ImageSearchClient::new);

    match client {
        Ok(client) => {
            tracing::info!(base_url = %client.config().base_url(), "image search client ready");
            let api: Arc<dyn ImageSearchApi> = Arc::new(client);
            (api, None)
        }
        Err(err) => {
            tracing::warn!("image search unavailable: {err}");
            let api: Arc<dyn ImageSearchApi> = Arc::new(MissingImageSearchApi::new(err.clone()));
            (api, Some(err))
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (api, startup_error) = build_search_api(args.config.as_deref());
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(api, cmd_rx, ui_tx);

    let startup = StartupConfig {
        initial_query: args.query,
        startup_error,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image Gallery")
            .with_inner_size([1180.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Image Gallery",
        options,
        Box::new(|_cc| Ok(Box::new(GalleryApp::bootstrap(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow!("failed to run gallery window: {err}"))
}

pub mod actions;
pub(crate) mod cli;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod intent;
pub(crate) mod launcher;
pub(crate) mod logging;
pub mod params;
pub mod state;
pub mod transcription;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

pub use state::AppState;

/// Parse flags, load the config and either run one command or serve the API.
pub async fn run() -> anyhow::Result<()> {
    let args = cli::CliArgs::parse();
    logging::init(&args.log);

    let config_path = args.config_path();
    let mut config = config::load_or_init_app_config(&config_path);
    args.apply(&mut config);
    info!("Using config {}", config_path.display());

    let state = Arc::new(AppState::from_config(config));

    if let Some(command) = args.command {
        let dispatcher = state.dispatcher.clone();
        let response = tokio::task::spawn_blocking(move || dispatcher.dispatch(&command))
            .await
            .context("command task failed")??;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    http::start_server(state).await
}

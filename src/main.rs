mod command;
mod config;
mod render;
mod runner;
mod source;
mod store;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, ".env not loaded");
        }
    }

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut runner = runner::Runner::new(config.clone());
    if let Err(e) = runner.bootstrap().await {
        tracing::error!(error = %e, "scene store unreadable");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        store = %config.store_path.display(),
        width = config.scene_width,
        height = config.scene_height,
        "playfield running"
    );
    runner.run(runner::spawn_stdin()).await;
    ExitCode::SUCCESS
}

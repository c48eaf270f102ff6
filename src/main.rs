mod api;
mod app;
mod config;
mod db;
mod domain;
mod extractor;
mod infrastructure;
mod messenger;
mod page;
mod providers;
mod render;
mod tasks;
#[cfg(test)]
mod testsupport;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown::Shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let app = app::GuardianApp::initialize(config, paths, shutdown.clone()).await?;
    app.run().await
}

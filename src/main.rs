mod app;
mod classifier;
mod config;
mod db;
mod dom;
mod domain;
mod infrastructure;
mod locator;
mod page_source;
mod render;
mod tasks;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::PositiveNewsApp::initialize(config, paths, shutdown).await?;
    app.run().await
}

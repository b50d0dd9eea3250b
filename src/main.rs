use anyhow::{Context, Result};
use clap::Parser;

use bug_point::board::server;
use bug_point::config::{Cli, Config};
use bug_point::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry everything.
    dotenvy::dotenv().ok();

    let config = Config::from_cli(Cli::parse())?;
    logging::init(config.log_json);

    let store = server::open_store(&config)
        .await
        .context("Failed to open document store")?;

    server::start_server(config.server, store)
        .await
        .context("Server failed")?;

    Ok(())
}

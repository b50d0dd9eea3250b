use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use crate::board::server::ServerConfig;

/// Command-line interface. Every setting that matters in deployment can
/// also come from the environment (or a `.env` file).
#[derive(Debug, Parser)]
#[command(name = "bug-point")]
#[command(version, about = "Kanban bug tracker back-end: bugs, lanes and tasks over REST")]
pub struct Cli {
    /// MongoDB connection string
    #[arg(long, env = "MONGO_DB_URL", hide_env_values = true)]
    pub mongo_url: Option<String>,

    /// Logical database holding the `bugs`, `lane` and `tasks` collections
    #[arg(long, env = "BUG_POINT_DB", default_value = "bug-point")]
    pub database: String,

    /// Address to listen on
    #[arg(long, env = "BUG_POINT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to serve on
    #[arg(short, long, env = "BUG_POINT_PORT", default_value = "4000")]
    pub port: u16,

    /// Bound on connecting to and pinging the store at startup
    #[arg(long, default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Bound on each store operation while serving a request
    #[arg(long, default_value = "5")]
    pub request_timeout_secs: u64,

    /// Keep data in process memory instead of MongoDB (lost on exit)
    #[arg(long)]
    pub in_memory: bool,

    /// Enable permissive CORS for a local front-end dev server
    #[arg(long)]
    pub cors: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Mongo { url: String, database: String },
    Memory,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub connect_timeout: Duration,
    pub server: ServerConfig,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            connect_timeout: Duration::from_secs(10),
            server: ServerConfig::default(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let store = match (cli.in_memory, cli.mongo_url) {
            (true, _) => StoreBackend::Memory,
            (false, Some(url)) if !url.trim().is_empty() => StoreBackend::Mongo {
                url,
                database: cli.database,
            },
            (false, _) => bail!("MONGO_DB_URL is not set (pass --mongo-url or --in-memory)"),
        };

        if cli.request_timeout_secs == 0 || cli.connect_timeout_secs == 0 {
            bail!("Timeouts must be at least one second");
        }

        Ok(Self {
            store,
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            server: ServerConfig {
                host: cli.host,
                port: cli.port,
                request_timeout: Duration::from_secs(cli.request_timeout_secs),
                cors: cli.cors,
            },
            log_json: cli.log_json,
        })
    }
}

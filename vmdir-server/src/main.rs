//! vmdir directory server core
//!
//! Loads the schema, starts the watch dispatcher and waits for Ctrl-C,
//! logging a status line periodically.
//!
//! Usage:
//!   vmdir-server --config /etc/vmdir/server.toml
//!   vmdir-server --schema vmdir.schema --verbose

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vmdir_server::{DirectoryServerState, ServerConfig, WatchDispatcher};

#[derive(Parser, Debug)]
#[command(name = "vmdir-server")]
#[command(about = "Directory server core: schema, replication bookkeeping and watch dispatch")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema file to load, overriding the configuration
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Print the status as JSON and exit
    #[arg(long)]
    status: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(schema) = args.schema {
        config.schema_file = Some(schema);
    }

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("vmdir server starting...");
    let state = Arc::new(
        DirectoryServerState::new(&config).context("initializing directory server state")?,
    );

    if args.status {
        println!("{}", serde_json::to_string_pretty(&state.status())?);
        return Ok(());
    }

    let dispatcher = WatchDispatcher::spawn(Arc::clone(&state), config.batch_size)
        .context("starting watch dispatcher")?;

    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!(status = %serde_json::to_string(&state.status())?, "server status");
            }
            result = &mut shutdown => {
                result.context("waiting for shutdown signal")?;
                info!("shutdown requested");
                break;
            }
        }
    }

    // The dispatcher thread blocks on the session queue.
    tokio::task::spawn_blocking(move || dispatcher.stop())
        .await
        .context("stopping watch dispatcher")?;

    println!("{}", serde_json::to_string_pretty(&state.status())?);
    info!("vmdir server stopped");
    Ok(())
}

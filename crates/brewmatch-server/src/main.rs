//! brewmatch item-store server binary.
//!
//! Loads or creates a snapshot and serves the bot's tables over a Unix domain
//! socket.

use std::path::PathBuf;

use brewmatch_server::{BrewmatchServer, ItemStore};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "brewmatch-server", about = "Item store for the brewmatch bot")]
struct Cli {
    /// Unix socket to listen on.
    #[arg(long, env = "BREWMATCH_SOCKET")]
    socket: Option<PathBuf>,

    /// Snapshot file holding every table.
    #[arg(long, env = "BREWMATCH_DATA")]
    data: Option<PathBuf>,

    /// Keep tables in memory only; no snapshot is read or written.
    #[arg(long, conflicts_with = "data")]
    in_memory: bool,

    /// Extra table to register, as NAME=KEY_ATTRIBUTE. Repeatable.
    #[arg(long = "table", value_name = "NAME=KEY", value_parser = parse_table)]
    tables: Vec<(String, String)>,
}

fn parse_table(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, key)) if !name.is_empty() && !key.is_empty() => {
            Ok((name.to_string(), key.to_string()))
        }
        _ => Err(format!("expected NAME=KEY_ATTRIBUTE, got '{s}'")),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brewmatch")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = default_data_dir();
    let socket_path = cli.socket.unwrap_or_else(|| data_dir.join("server.sock"));
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = if cli.in_memory {
        info!(socket = %socket_path.display(), "starting in memory");
        ItemStore::in_memory()
    } else {
        let data_path = cli.data.unwrap_or_else(|| data_dir.join("items.json"));
        if let Some(parent) = data_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!(data = %data_path.display(), socket = %socket_path.display(), "starting");
        ItemStore::open(&data_path)?
    };

    store.ensure_bot_tables()?;
    for (name, key_attribute) in &cli.tables {
        store.create_table(name, key_attribute)?;
    }

    let server = BrewmatchServer::new(store, socket_path);
    server.run().await?;

    Ok(())
}

//! # Herald — scheduled group broadcast engine.
//!
//! Delivers one randomly chosen payload from the catalog to every eligible
//! chat group at each configured wall-clock time, with jittered spacing
//! between sends and per-group failure isolation.
//!
//! Usage:
//!   herald                         # Start with ~/.herald/config.toml
//!   herald --config herald.toml    # Custom config
//!   herald --verbose               # Debug logging
//!
//! Once running, operator commands are read from stdin (type 'help').

mod commands;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use herald_broadcast::BroadcastEngine;
use herald_broadcast::trigger::format_schedule;
use herald_catalog::CatalogStore;
use herald_channels::OneBotChannel;
use herald_core::traits::Transport;
use herald_core::types::RecipientId;
use herald_core::HeraldConfig;

use crate::commands::CommandHandler;

#[derive(Parser)]
#[command(name = "herald", version, about = "Scheduled group broadcast engine")]
struct Cli {
    /// Config file path (default: ~/.herald/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for the payload catalog (default: ~/.herald)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.unwrap_or_else(HeraldConfig::default_path);
    let config = if config_path.exists() {
        HeraldConfig::load_from(&config_path)?
    } else {
        HeraldConfig::default()
    };

    let store = CatalogStore::new(&cli.data_dir.unwrap_or_else(CatalogStore::default_path));
    let catalog = Arc::new(RwLock::new(store.load()));
    tracing::info!("Loaded {} payload(s)", catalog.read().await.len());

    let excluded: HashSet<RecipientId> = config
        .broadcast
        .disabled_groups
        .iter()
        .map(|g| RecipientId::from(g.clone()))
        .collect();
    let excluded = Arc::new(RwLock::new(excluded));

    let channel = Arc::new(OneBotChannel::new(config.onebot.clone()));
    let transport: Arc<dyn Transport> = channel.clone();
    let engine = Arc::new(BroadcastEngine::new(
        transport,
        catalog.clone(),
        excluded.clone(),
        config.broadcast.jitter_range(),
    ));

    // Arm any schedule carried in the config.
    if !config.broadcast.times.is_empty() {
        let spec = config.broadcast.times.join(",");
        match engine.set_triggers(&spec).await {
            Ok(times) => tracing::info!("Armed from config: {}", format_schedule(&times)),
            Err(e) => tracing::warn!("Ignoring configured broadcast times: {e}"),
        }
    }

    let handler = CommandHandler::new(
        engine.clone(),
        catalog,
        store,
        excluded,
        channel,
        config,
        config_path,
    );

    println!("herald ready — type 'help' for commands");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        println!("{}", handler.handle(line).await);
    }

    engine.shutdown().await;
    Ok(())
}

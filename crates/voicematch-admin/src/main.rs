//! voicematch-admin: operator CLI for the VoiceMatch quota & penalty engine.
//!
//! Opens the engine database in the configured data directory, runs one
//! command and prints its result as JSON on stdout. Logs go to stderr.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use voicematch_engine::{Engine, EngineConfig, SqliteStore};
use voicematch_types::TimestampMs;

use crate::commands::{
    engagement::MessageCommand, penalty::PenaltyCommand, profile::ProfileCommand,
    quota::QuotaCommand, AdminEngine,
};

#[derive(Parser)]
#[command(name = "voicematch-admin")]
#[command(about = "Inspect and administer VoiceMatch quotas and penalties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to config.toml in the data directory)
    #[arg(short, long, global = true, env = "VOICEMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory from the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Evaluate at this instant (epoch millis) instead of the wall clock
    #[arg(long, global = true)]
    now: Option<TimestampMs>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile lifecycle and tiers
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Quota inspection and admission
    #[command(subcommand)]
    Quota(QuotaCommand),

    /// Reports, locks and admin overrides
    #[command(subcommand)]
    Penalty(PenaltyCommand),

    /// Voice messages and listen counts
    #[command(subcommand)]
    Message(MessageCommand),

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Load config
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.display().to_string();
    }

    // 2. Initialize tracing
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("voicematch={level}").parse()?),
        )
        .init();

    // 3. Dispatch; every command except `config` opens the database
    let now = cli.now.unwrap_or_else(voicematch_types::now_millis);
    let output = match cli.command {
        Commands::Config => serde_json::to_value(&config)?,
        Commands::Profile(cmd) => commands::profile::run(&open_engine(config)?, cmd, now).await?,
        Commands::Quota(cmd) => commands::quota::run(&open_engine(config)?, cmd, now).await?,
        Commands::Penalty(cmd) => commands::penalty::run(&open_engine(config)?, cmd, now).await?,
        Commands::Message(cmd) => {
            commands::engagement::run(&open_engine(config)?, cmd, now).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Open the database in the configured data directory.
fn open_engine(config: EngineConfig) -> anyhow::Result<AdminEngine> {
    std::fs::create_dir_all(config.data_dir())?;
    let db_path = config.database_path();
    debug!("Opening database at {:?}", db_path);
    let store = SqliteStore::open(&db_path)?;
    Ok(Engine::new(config, store)?)
}

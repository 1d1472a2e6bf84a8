//! # ks-cli
//!
//! Command-line interface for Keepsake goal tracking.
//!
//! Drives the goal lifecycle from the terminal:
//! - `ks goal create` — propose a goal for a redeemed gift
//! - `ks goal approve/reject` — the giver's approval handshake
//! - `ks goal log` — count a session toward the current week
//! - `ks goal list/status` — inspect progress
//! - `ks goal reveal/delete` — post-completion reveal and cleanup

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::AppConfig;

/// Keepsake CLI — track goals that unlock gifted experiences.
#[derive(Parser)]
#[command(name = "ks", version, about)]
struct Cli {
    /// Data root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_root = cli.data_root.canonicalize().unwrap_or(cli.data_root);
    let config = AppConfig::for_root(&data_root);

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &config),
    }
}

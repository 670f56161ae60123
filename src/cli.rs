//! Command-line interface for memory_match.

use clap::{Parser, Subcommand};
use memory_match::Difficulty;

/// Memory Match - card-matching game with ledger-backed player statistics
#[derive(Parser, Debug)]
#[command(name = "memory_match")]
#[command(about = "Memory-matching game with ledger-backed stats", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the stats HTTP server and ledger relay
    Serve {
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Keep stats in process memory instead of the ledger
        #[arg(long)]
        in_memory: bool,
    },

    /// Play a game in the terminal
    Play {
        /// Difficulty tier (easy, medium, hard); defaults to the config value
        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Stats server URL; if not provided, talks to the ledger directly
        #[arg(long)]
        server_url: Option<String>,

        /// Keep stats in process memory for this run only
        #[arg(long, conflicts_with = "server_url")]
        in_memory: bool,

        /// File holding this client's player id (created if missing)
        #[arg(long, default_value = ".memory_match_player")]
        identity_file: std::path::PathBuf,
    },
}

//! Command-line interface definitions using clap
//!
//! Every command operates directly on the configured storage backend.

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::run_command;

/// Linkvault - URL shortening storage layer
#[derive(Parser)]
#[command(name = "linkvault")]
#[command(version)]
#[command(about = "Shorten, resolve and manage URLs on the configured storage backend", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Shorten a URL (returns the existing key if already shortened)
    Shorten {
        /// URL to shorten
        url: String,

        /// Owner id to record on a newly created link
        #[arg(long)]
        owner: Option<String>,
    },

    /// Shorten every item of a JSON file: [{"correlation_id": "...", "original_url": "..."}]
    Batch {
        /// Input file path
        file_path: String,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Resolve a short key to its original URL
    Resolve {
        short_key: String,
    },

    /// List the active links of an owner
    List {
        #[arg(long)]
        owner: String,
    },

    /// Soft-delete links owned by an owner
    Delete {
        #[arg(long)]
        owner: String,

        /// Short keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show record and owner counts
    Stats,

    /// Check that the storage backend is reachable
    Ping,

    /// Mint or verify identity tokens
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Identity token commands
#[derive(Subcommand)]
pub enum TokenCommands {
    /// Mint a token (a new anonymous owner when none is given)
    Mint {
        owner: Option<String>,
    },

    /// Verify a token and print its owner
    Verify {
        token: String,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    /// 是否需要打开存储后端
    pub fn needs_storage(&self) -> bool {
        !matches!(self, Commands::Token { .. } | Commands::Config { .. })
    }
}

//! CLI command runners

mod config_gen;
mod links;
mod system;
mod token;

use std::sync::Arc;

use anyhow::{Context, Result};

use super::{Commands, ConfigCommands, TokenCommands};
use crate::config::StaticConfig;
use crate::identity::IdentityCodec;
use crate::storage::{StorageFactory, UrlStore};

/// Run a CLI command from clap-parsed input
pub async fn run_command(cmd: Commands, config: &StaticConfig) -> Result<()> {
    // 不需要存储的命令
    match cmd {
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => return config_gen::generate_config(output_path, force),
        Commands::Token { action } => {
            let codec = IdentityCodec::from_config(&config.identity)?;
            return match action {
                TokenCommands::Mint { owner } => token::mint(&codec, owner),
                TokenCommands::Verify { token } => token::verify(&codec, &token),
            };
        }
        _ => {}
    }

    let store: Arc<dyn UrlStore> = StorageFactory::create(config)
        .await
        .context("Failed to create storage backend")?;

    match cmd {
        Commands::Shorten { url, owner } => {
            links::shorten(store, config, &url, owner.as_deref()).await
        }
        Commands::Batch { file_path, owner } => {
            links::shorten_file(store, config, &file_path, owner.as_deref()).await
        }
        Commands::Resolve { short_key } => links::resolve(store, config, &short_key).await,
        Commands::List { owner } => links::list(store, config, &owner).await,
        Commands::Delete { owner, keys } => links::delete(store, config, &owner, &keys).await,
        Commands::Stats => system::stats(store).await,
        Commands::Ping => system::ping(store).await,
        Commands::Token { .. } | Commands::Config { .. } => unreachable!("handled above"),
    }
}

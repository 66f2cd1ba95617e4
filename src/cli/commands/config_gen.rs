//! Generate config command

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use colored::Colorize;

use crate::config::StaticConfig;

/// Generate example configuration file
pub fn generate_config(output_path: Option<String>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    if Path::new(&path).exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path);
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    StaticConfig::default()
        .save_to_file(&path)
        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    Ok(())
}

//! Link commands: shorten, batch, resolve, list, delete

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::StaticConfig;
use crate::services::{BatchDeleter, BatchItem, ShortenerService};
use crate::storage::{InsertOutcome, UrlStore};

pub async fn shorten(
    store: Arc<dyn UrlStore>,
    config: &StaticConfig,
    url: &str,
    owner: Option<&str>,
) -> Result<()> {
    let service = ShortenerService::new(store, &config.shortener)?;
    let inserted = service.shorten(url, owner).await?;

    match inserted.outcome {
        InsertOutcome::Created => println!(
            "{} Created short link: {} -> {}",
            "✓".bold().green(),
            inserted.short_key.cyan(),
            url.blue().underline()
        ),
        InsertOutcome::AlreadyExists => println!(
            "{} Already shortened: {} -> {}",
            "ℹ".bold().blue(),
            inserted.short_key.cyan(),
            url.blue().underline()
        ),
    }
    Ok(())
}

pub async fn shorten_file(
    store: Arc<dyn UrlStore>,
    config: &StaticConfig,
    file_path: &str,
    owner: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {}", file_path))?;
    let items: Vec<BatchItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file_path))?;

    let service = ShortenerService::new(store, &config.shortener)?;
    let results = service.shorten_batch(&items, owner).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

pub async fn resolve(store: Arc<dyn UrlStore>, config: &StaticConfig, short_key: &str) -> Result<()> {
    let service = ShortenerService::new(store, &config.shortener)?;
    let url = service.resolve(short_key).await?;
    println!("{}", url);
    Ok(())
}

pub async fn list(store: Arc<dyn UrlStore>, config: &StaticConfig, owner: &str) -> Result<()> {
    let service = ShortenerService::new(store, &config.shortener)?;
    let links = service.list_owned(owner).await?;

    if links.is_empty() {
        println!("{} No links for {}", "ℹ".bold().blue(), owner.magenta());
        return Ok(());
    }

    println!("{}", format!("Links of {}:", owner).bold().green());
    for link in &links {
        println!(
            "  {} -> {}",
            link.short_key.cyan(),
            link.original_url.blue().underline()
        );
    }
    println!("{} {} link(s)", "ℹ".bold().blue(), links.len());
    Ok(())
}

pub async fn delete(
    store: Arc<dyn UrlStore>,
    config: &StaticConfig,
    owner: &str,
    keys: &[String],
) -> Result<()> {
    let deleter = BatchDeleter::new(store, &config.deleter);
    let summary = deleter.delete(owner, keys).await?;

    println!(
        "{} Submitted {} key(s) in {} batch(es) for deletion",
        "✓".bold().green(),
        summary.requested.to_string().cyan(),
        summary.batches
    );
    Ok(())
}

//! Backend commands: stats, ping

use std::sync::Arc;

use anyhow::{Result, bail};
use colored::Colorize;

use crate::services::{HealthService, StatisticsReader};
use crate::storage::UrlStore;

pub async fn stats(store: Arc<dyn UrlStore>) -> Result<()> {
    let backend = store.backend_name();
    let stats = StatisticsReader::new(store).snapshot().await?;

    println!("{} {}", "Backend:".bold(), backend.cyan());
    println!("{} {}", "URLs:".bold(), stats.urls.to_string().green());
    println!("{} {}", "Owners:".bold(), stats.owners.to_string().green());
    Ok(())
}

pub async fn ping(store: Arc<dyn UrlStore>) -> Result<()> {
    let report = HealthService::check(store.as_ref()).await;

    if !report.healthy {
        bail!(
            "{} backend unhealthy: {}",
            report.backend,
            report.error.unwrap_or_default()
        );
    }

    println!(
        "{} {} backend healthy ({} ms)",
        "✓".bold().green(),
        report.backend.cyan(),
        report.latency_ms
    );
    Ok(())
}

use std::sync::{Arc, OnceLock};

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<Arc<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns defaults (plus environment overrides) when `init_config` never
/// succeeded.
pub fn get_config() -> Arc<StaticConfig> {
    match CONFIG.get() {
        Some(config) => Arc::clone(config),
        None => Arc::new(StaticConfig::try_load(super::DEFAULT_CONFIG_PATH).unwrap_or_default()),
    }
}

/// Initialize the global configuration
///
/// `path` overrides the default `config.toml`. A missing explicit path or a
/// file that fails to parse is returned as an error and nothing is stored.
/// Only the first successful call takes effect.
pub fn init_config(path: Option<&str>) -> Result<()> {
    if CONFIG.get().is_some() {
        return Ok(());
    }
    let config = StaticConfig::load(path)?;
    let _ = CONFIG.set(Arc::new(config));
    Ok(())
}

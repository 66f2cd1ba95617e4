use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::index::{Admission, UrlIndex};
use super::models::{Inserted, Lookup, OwnedUrl, StoreStats, UrlRecord};
use super::{UrlStore, ensure_valid_key};
use crate::errors::{LinkvaultError, Result};

/// 进程内存储，重启即丢失
pub struct MemoryStore {
    index: RwLock<UrlIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Memory storage initialized");
        Self {
            index: RwLock::new(UrlIndex::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn insert(
        &self,
        candidate_key: &str,
        original_url: &str,
        owner: Option<&str>,
    ) -> Result<Inserted> {
        ensure_valid_key(candidate_key)?;
        let mut index = self.index.write();

        match index.admit(candidate_key, original_url) {
            Admission::Existing(key) => Ok(Inserted::already_exists(key)),
            Admission::Collision => Err(LinkvaultError::key_collision(format!(
                "short key already taken: {}",
                candidate_key
            ))),
            Admission::Vacant => {
                index.put(UrlRecord::new(candidate_key, original_url, owner));
                debug!("Short key created: {}", candidate_key);
                Ok(Inserted::created(candidate_key))
            }
        }
    }

    async fn read(&self, short_key: &str) -> Result<Lookup> {
        Ok(self.index.read().lookup(short_key))
    }

    async fn read_all_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        Ok(self.index.read().owned_by(owner))
    }

    async fn soft_delete_batch(&self, owner: &str, short_keys: &[String]) -> Result<()> {
        let mut index = self.index.write();

        let targets = index.deletable(owner, short_keys);
        for key in &targets {
            index.mark_deleted(key);
        }

        debug!(
            "Soft-deleted {}/{} keys for owner {}",
            targets.len(),
            short_keys.len(),
            owner
        );
        Ok(())
    }

    async fn count(&self) -> Result<StoreStats> {
        Ok(self.index.read().stats())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

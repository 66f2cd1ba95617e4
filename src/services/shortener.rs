//! URL shortening service
//!
//! Wraps a [`UrlStore`] with the deduplicating insert protocol: generate a
//! random candidate key, let the backend arbitrate, and return whatever key
//! the backend reports as canonical for the URL. Submitting the same URL
//! again returns the same key with [`InsertOutcome::AlreadyExists`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShortenerConfig;
use crate::errors::{LinkvaultError, Result};
use crate::storage::{InsertOutcome, Inserted, Lookup, OwnedUrl, UrlStore};
use crate::utils::generate_random_code;

/// 短码最大长度，与 urls.short_url 列宽一致
pub const MAX_KEY_LENGTH: usize = 32;

/// 批量缩短的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// 批量缩短的单项结果，保留调用方的 correlation_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_key: String,
    pub outcome: InsertOutcome,
}

pub struct ShortenerService {
    store: Arc<dyn UrlStore>,
    key_length: usize,
    max_key_attempts: u32,
}

impl ShortenerService {
    pub fn new(store: Arc<dyn UrlStore>, config: &ShortenerConfig) -> Result<Self> {
        if config.key_length == 0 || config.key_length > MAX_KEY_LENGTH {
            return Err(LinkvaultError::config(format!(
                "shortener.key_length must be between 1 and {}, got {}",
                MAX_KEY_LENGTH, config.key_length
            )));
        }

        Ok(Self {
            store,
            key_length: config.key_length,
            max_key_attempts: config.max_key_attempts.max(1),
        })
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        &self.store
    }

    /// 缩短一个 URL；同一 URL 始终得到同一个短码
    pub async fn shorten(&self, original_url: &str, owner: Option<&str>) -> Result<Inserted> {
        if original_url.trim().is_empty() {
            return Err(LinkvaultError::validation("original url must not be empty"));
        }

        for attempt in 1..=self.max_key_attempts {
            let candidate = generate_random_code(self.key_length);

            match self.store.insert(&candidate, original_url, owner).await {
                Ok(inserted) => {
                    match inserted.outcome {
                        InsertOutcome::Created => {
                            info!("Shortened {} -> {}", original_url, inserted.short_key)
                        }
                        InsertOutcome::AlreadyExists => debug!(
                            "{} already shortened as {}",
                            original_url, inserted.short_key
                        ),
                    }
                    return Ok(inserted);
                }
                Err(LinkvaultError::KeyCollision(msg)) => {
                    debug!(
                        "Candidate key collision (attempt {}/{}): {}",
                        attempt, self.max_key_attempts, msg
                    );
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "Gave up shortening {} after {} key collisions",
            original_url, self.max_key_attempts
        );
        Err(LinkvaultError::key_collision(format!(
            "no free short key after {} attempts",
            self.max_key_attempts
        )))
    }

    /// 按顺序缩短多个 URL，结果与输入一一对应
    ///
    /// 不是事务：中途出错时前面的项已经落库，错误直接返回。
    pub async fn shorten_batch(
        &self,
        items: &[BatchItem],
        owner: Option<&str>,
    ) -> Result<Vec<BatchResult>> {
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let inserted = self
                .shorten(&item.original_url, owner)
                .await
                .map_err(|e| match e {
                    LinkvaultError::Validation(msg) => LinkvaultError::validation(format!(
                        "item {}: {}",
                        item.correlation_id, msg
                    )),
                    other => other,
                })?;

            results.push(BatchResult {
                correlation_id: item.correlation_id.clone(),
                short_key: inserted.short_key,
                outcome: inserted.outcome,
            });
        }

        Ok(results)
    }

    pub async fn lookup(&self, short_key: &str) -> Result<Lookup> {
        self.store.read(short_key).await
    }

    /// 解析短码；不存在返回 NotFound，已删除返回 Gone
    pub async fn resolve(&self, short_key: &str) -> Result<String> {
        match self.store.read(short_key).await? {
            Lookup::Active(url) => Ok(url),
            Lookup::Deleted(_) => Err(LinkvaultError::gone(format!(
                "short key has been deleted: {}",
                short_key
            ))),
            Lookup::Missing => Err(LinkvaultError::not_found(format!(
                "short key not found: {}",
                short_key
            ))),
        }
    }

    pub async fn list_owned(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        self.store.read_all_by_owner(owner).await
    }
}

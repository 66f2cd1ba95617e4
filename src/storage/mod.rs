//! URL storage backends
//!
//! [`UrlStore`] is the contract every backend implements. The concrete
//! backend is chosen once at startup by [`StorageFactory`] from the
//! configured [`BackendKind`] and handed around as `Arc<dyn UrlStore>`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StaticConfig;
use crate::errors::{LinkvaultError, Result};
use crate::utils::is_valid_short_key;

pub mod file;
pub(crate) mod index;
pub mod memory;
pub mod models;
pub mod relational;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::{InsertOutcome, Inserted, Lookup, OwnedUrl, StoreStats, UrlRecord};
pub use relational::RelationalStore;

/// 存储后端契约
///
/// 预期内的结果（已存在、未找到、已删除）通过返回值表达，只有基础设施故障才返回 `Err`。
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// 以 `candidate_key` 为短码插入 `original_url`
    ///
    /// 同一 URL 已有有效记录时返回 `AlreadyExists` 和已有短码，候选短码被丢弃。
    /// 候选短码已被其他记录占用时返回 `KeyCollision`，由调用方换一个候选重试。
    /// 候选短码不是 1-32 位字母数字时返回 `Validation`。
    /// 对同一 URL 的并发调用恰好有一个得到 `Created`。
    async fn insert(
        &self,
        candidate_key: &str,
        original_url: &str,
        owner: Option<&str>,
    ) -> Result<Inserted>;

    async fn read(&self, short_key: &str) -> Result<Lookup>;

    /// owner 名下的有效链接，不含已删除记录
    async fn read_all_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>>;

    /// 软删除 owner 名下的短码；不属于 owner 或不存在的短码静默跳过
    async fn soft_delete_batch(&self, owner: &str, short_keys: &[String]) -> Result<()>;

    async fn count(&self) -> Result<StoreStats>;

    /// 健康探测
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

/// 候选短码必须能被每个后端原样保存并在重启后读回
pub(crate) fn ensure_valid_key(candidate_key: &str) -> Result<()> {
    if is_valid_short_key(candidate_key) {
        Ok(())
    } else {
        Err(LinkvaultError::validation(format!(
            "invalid short key {:?}: expected 1-32 ASCII letters or digits",
            candidate_key
        )))
    }
}

/// 后端类型，由配置解析得到
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Relational(String),
    File(PathBuf),
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Relational(_) => write!(f, "relational"),
            BackendKind::File(path) => write!(f, "file ({})", path.display()),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &StaticConfig) -> Result<Arc<dyn UrlStore>> {
        let kind = config.storage.backend_kind();
        info!("Selected storage backend: {}", kind);
        Self::create_kind(kind, config).await
    }

    pub async fn create_kind(kind: BackendKind, config: &StaticConfig) -> Result<Arc<dyn UrlStore>> {
        let store: Arc<dyn UrlStore> = match kind {
            BackendKind::Relational(url) => {
                Arc::new(RelationalStore::connect(&url, &config.database).await?)
            }
            BackendKind::File(path) => Arc::new(FileStore::open(path)?),
            BackendKind::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

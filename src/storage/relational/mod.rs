//! SeaORM storage backend
//!
//! Relational storage over SQLite, MySQL/MariaDB and PostgreSQL. Active-URL
//! uniqueness is enforced by the database: a partial unique index on
//! `original_url WHERE is_deleted = false` (SQLite, PostgreSQL), or a unique
//! stored column holding `SHA2(original_url)` for active rows and NULL for
//! deleted ones (MySQL). A unique violation on insert is resolved by fetching
//! the row that won.
//!
//! Every call runs under a hard deadline (`database.timeout_ms` unless
//! overridden with [`RelationalStore::with_timeout`]). Read queries retry
//! transient errors inside that deadline; writes are attempted once.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use super::{UrlStore, ensure_valid_key};
use super::models::{Inserted, Lookup, OwnedUrl, StoreStats};
use crate::config::DatabaseConfig;
use crate::errors::{LinkvaultError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_record, new_active_model};
pub use retry::RetryPolicy;

/// 统计缓存 TTL
const STATS_CACHE_TTL: Duration = Duration::from_secs(30);
const STATS_CACHE_KEY: &str = "stats";

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<&'static str> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite")
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql")
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(LinkvaultError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 给 DbErr 加上下文，保留连接类错误的分类
pub(crate) fn db_error(context: &str, err: DbErr) -> LinkvaultError {
    match LinkvaultError::from(err) {
        LinkvaultError::DatabaseConnection(msg) => {
            LinkvaultError::database_connection(format!("{}: {}", context, msg))
        }
        other => LinkvaultError::database_operation(format!("{}: {}", context, other.message())),
    }
}

/// count() 缓存（TTL 30秒，写入时失效）
///
/// 每次失效把代数加一。查询前记下的代数与回填时不同，说明查询期间有写入，
/// 结果可能已过时，不回填。
#[derive(Clone)]
struct StatsCache {
    cache: Cache<&'static str, StoreStats>,
    generation: Arc<AtomicU64>,
}

impl StatsCache {
    fn new() -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(STATS_CACHE_TTL)
                .max_capacity(1)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn get(&self) -> Option<StoreStats> {
        self.cache.get(&STATS_CACHE_KEY)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 代数未变时回填，返回是否已缓存
    fn store(&self, seen: u64, stats: StoreStats) -> bool {
        if self.generation() != seen {
            return false;
        }
        self.cache.insert(STATS_CACHE_KEY, stats);
        // 失效可能夹在检查与插入之间
        if self.generation() != seen {
            self.cache.invalidate_all();
            return false;
        }
        true
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }
}

/// SeaORM-based URL store
#[derive(Clone)]
pub struct RelationalStore {
    db: DatabaseConnection,
    backend_name: &'static str,
    stats_cache: StatsCache,
    retry_policy: RetryPolicy,
    op_timeout: Duration,
}

impl RelationalStore {
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let database_url = database_url.trim();
        if database_url.is_empty() {
            return Err(LinkvaultError::database_config("database URL is empty"));
        }

        let backend_name = infer_backend_from_url(database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config.pool_size).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;

        info!("{} storage initialized", backend_name.to_uppercase());
        Ok(Self::from_connection(db, backend_name, config))
    }

    /// 基于已有连接构造（迁移需由调用方保证）
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &'static str,
        config: &DatabaseConfig,
    ) -> Self {
        Self {
            db,
            backend_name,
            stats_cache: StatsCache::new(),
            retry_policy: RetryPolicy::from(config),
            op_timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// 覆盖单次调用的超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.op_timeout
    }

    /// 清除统计缓存（数据变更时调用）
    pub fn invalidate_stats_cache(&self) {
        self.stats_cache.invalidate();
    }

    /// 在单次调用超时内执行；超时后 future 被丢弃，未提交的事务随之回滚
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LinkvaultError::timeout(format!(
                "{} timed out after {} ms",
                operation,
                self.op_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl UrlStore for RelationalStore {
    async fn insert(
        &self,
        candidate_key: &str,
        original_url: &str,
        owner: Option<&str>,
    ) -> Result<Inserted> {
        ensure_valid_key(candidate_key)?;
        self.bounded(
            "insert",
            self.insert_url(candidate_key, original_url, owner),
        )
        .await
    }

    async fn read(&self, short_key: &str) -> Result<Lookup> {
        self.bounded("read", self.find_by_key(short_key)).await
    }

    async fn read_all_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        self.bounded("read_all_by_owner", self.find_by_owner(owner))
            .await
    }

    async fn soft_delete_batch(&self, owner: &str, short_keys: &[String]) -> Result<()> {
        self.bounded(
            "soft_delete_batch",
            self.soft_delete_owned(owner, short_keys),
        )
        .await
    }

    async fn count(&self) -> Result<StoreStats> {
        if let Some(stats) = self.stats_cache.get() {
            return Ok(stats);
        }

        let seen = self.stats_cache.generation();
        let stats = self.bounded("count", self.count_active()).await?;
        self.stats_cache.store(seen, stats);
        Ok(stats)
    }

    async fn ping(&self) -> Result<()> {
        self.bounded("ping", async {
            self.db.ping().await.map_err(|e| db_error("ping", e))
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}

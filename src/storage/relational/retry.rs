//! 只读查询的重试
//!
//! 连接断开、死锁、锁超时等瞬时错误按指数退避重试。写操作（insert、
//! 批量软删除）不经过这里，失败直接交给调用方。

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 可重试的数据库错误码
/// MySQL: 1213 死锁, 1205 锁等待超时
/// PostgreSQL: 40001 序列化失败, 40P01 死锁
/// SQLite: 5 BUSY, 6 LOCKED
const RETRYABLE_CODES: &[&str] = &["1213", "1205", "40001", "40P01", "5", "6"];

const RETRYABLE_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 判断数据库错误是否可重试
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => is_transient_runtime(runtime_err),
        _ => false,
    }
}

fn is_transient_runtime(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(code) = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code())
            {
                return RETRYABLE_CODES.contains(&code.as_ref());
            }
            // 非数据库错误（如 I/O）回退到消息匹配
            matches_transient_message(&sqlx_err.to_string())
        }
        RuntimeErr::Internal(msg) => matches_transient_message(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn matches_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_MESSAGES.iter().any(|m| message.contains(m))
}

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待时间（毫秒），指数增长并封顶，外加 0-25% 抖动
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        use rand::RngExt;

        let exponent = attempt.saturating_sub(1);
        let capped = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent))
            .min(self.max_delay_ms);
        let jitter = rand::rng().random_range(0..=capped / 4);
        capped.saturating_add(jitter)
    }
}

/// 执行只读查询，瞬时错误按策略重试
pub async fn retry_read<T, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    mut query: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        match query().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) if is_transient(&e) && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.backoff_ms(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {} ms",
                    operation,
                    attempt,
                    policy.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

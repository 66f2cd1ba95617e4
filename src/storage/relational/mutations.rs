//! Write operations for RelationalStore
//!
//! Writes are attempted once. A failed insert or delete batch surfaces to the
//! caller unchanged, except for unique violations on insert which are part of
//! the dedup protocol.

use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, SqlErr, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, warn};

use super::converters::new_active_model;
use super::{RelationalStore, db_error};
use crate::errors::{LinkvaultError, Result};
use crate::storage::models::Inserted;

use migration::entities::url_record;

/// 唯一约束冲突（short_url 或有效 original_url）
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    // 驱动没有给出结构化错误时回退到消息匹配
    let message = err.to_string().to_lowercase();
    message.contains("unique constraint")
        || message.contains("duplicate key")
        || message.contains("duplicate entry")
}

impl RelationalStore {
    pub(super) async fn insert_url(
        &self,
        candidate_key: &str,
        original_url: &str,
        owner: Option<&str>,
    ) -> Result<Inserted> {
        // 快路径：已有有效记录，不必触发约束
        if let Some(existing) = self.find_active_key(original_url).await? {
            return Ok(Inserted::already_exists(existing));
        }

        let model = new_active_model(candidate_key, original_url, owner);
        match url_record::Entity::insert(model).exec(&self.db).await {
            Ok(_) => {
                self.invalidate_stats_cache();
                debug!("Short key created: {}", candidate_key);
                Ok(Inserted::created(candidate_key))
            }
            Err(e) if is_unique_violation(&e) => {
                // 并发插入同一 URL 时输给了另一方，取回胜出的短码
                if let Some(existing) = self.find_active_key(original_url).await? {
                    debug!(
                        "Lost insert race for {}, using existing key {}",
                        original_url, existing
                    );
                    return Ok(Inserted::already_exists(existing));
                }

                if self.key_exists(candidate_key).await? {
                    return Err(LinkvaultError::key_collision(format!(
                        "short key already taken: {}",
                        candidate_key
                    )));
                }

                // 胜出的记录在重新查询前已被删除，交给调用方重试
                Err(LinkvaultError::database_operation(format!(
                    "unique violation without an active holder for {}",
                    original_url
                )))
            }
            Err(e) => Err(db_error("插入短链接失败", e)),
        }
    }

    /// 一个批次一个事务；任一语句失败则整批回滚
    pub(super) async fn soft_delete_owned(&self, owner: &str, short_keys: &[String]) -> Result<()> {
        if short_keys.is_empty() {
            return Ok(());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("开始事务失败", e))?;

        let mut affected = 0u64;
        for key in short_keys {
            let result = url_record::Entity::update_many()
                .col_expr(url_record::Column::IsDeleted, Expr::value(true))
                .filter(url_record::Column::ShortUrl.eq(key.as_str()))
                .filter(url_record::Column::Owner.eq(owner))
                .filter(url_record::Column::IsDeleted.eq(false))
                .exec(&txn)
                .await;

            match result {
                Ok(res) => affected += res.rows_affected,
                Err(e) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        warn!("Rollback failed: {}", rollback_err);
                    }
                    return Err(db_error("批量软删除失败", e));
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| db_error("提交事务失败", e))?;

        if affected > 0 {
            self.invalidate_stats_cache();
        }
        debug!(
            "Soft-deleted {}/{} keys for owner {}",
            affected,
            short_keys.len(),
            owner
        );
        Ok(())
    }
}

//! original_url 唯一约束
//!
//! 只对未删除的记录生效，这样软删除后的 URL 可以重新生成短链。
//! 插入时的去重仲裁完全依赖这个约束。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                // 部分唯一索引
                conn.execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS uq_urls_active_original_url \
                     ON urls (original_url) WHERE is_deleted = false",
                )
                .await?;
            }
            DatabaseBackend::MySql => {
                // MySQL 不支持部分索引：用存储生成列代替。
                // 已删除记录的哈希为 NULL，多个 NULL 不冲突；
                // 对完整 URL 取哈希，避免前缀索引把不同的长 URL 判为重复
                conn.execute_unprepared(
                    "ALTER TABLE urls ADD COLUMN active_url_hash CHAR(64) \
                     AS (IF(is_deleted, NULL, SHA2(original_url, 256))) STORED",
                )
                .await?;
                conn.execute_unprepared(
                    "ALTER TABLE urls ADD UNIQUE INDEX uq_urls_active_original_url (active_url_hash)",
                )
                .await?;
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        match manager.get_database_backend() {
            DatabaseBackend::MySql => {
                conn.execute_unprepared("ALTER TABLE urls DROP INDEX uq_urls_active_original_url")
                    .await?;
                conn.execute_unprepared("ALTER TABLE urls DROP COLUMN active_url_hash")
                    .await?;
            }
            _ => {
                conn.execute_unprepared("DROP INDEX IF EXISTS uq_urls_active_original_url")
                    .await?;
            }
        }

        Ok(())
    }
}

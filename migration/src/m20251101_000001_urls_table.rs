//! urls 表迁移
//!
//! 每一行是一条短链映射：
//! - short_url 全局唯一（含已软删除的记录，短码永不复用）
//! - original_url 在未删除记录中唯一（见 m20251101_000002）
//! - is_deleted 只会从 false 变为 true

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Urls::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Urls::Owner).string_len(64).null())
                    .col(
                        ColumnDef::new(Urls::ShortUrl)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Urls::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(Urls::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Urls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_short_url")
                    .table(Urls::Table)
                    .col(Urls::ShortUrl)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_is_deleted")
                    .table(Urls::Table)
                    .col(Urls::IsDeleted)
                    .to_owned(),
            )
            .await?;

        // readAllByOwner 查询用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_owner")
                    .table(Urls::Table)
                    .col(Urls::Owner)
                    .to_owned(),
            )
            .await?;

        // MySQL 的 TEXT 列不能直接建索引，查重交给下一个迁移的哈希生成列
        if manager.get_database_backend() != DatabaseBackend::MySql {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_urls_original_url")
                        .table(Urls::Table)
                        .col(Urls::OriginalUrl)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::MySql {
            manager
                .drop_index(Index::drop().name("idx_urls_original_url").to_owned())
                .await?;
        }

        manager
            .drop_index(Index::drop().name("idx_urls_owner").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_urls_is_deleted").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_urls_short_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Urls {
    #[sea_orm(iden = "urls")]
    Table,
    Id,
    Owner,
    ShortUrl,
    OriginalUrl,
    IsDeleted,
    CreatedAt,
}

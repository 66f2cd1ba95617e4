//! Read-only queries for RelationalStore

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use super::converters::model_to_record;
use super::retry::retry_read;
use super::{RelationalStore, db_error};
use crate::errors::Result;
use crate::storage::models::{Lookup, OwnedUrl, StoreStats};

use migration::entities::url_record;

impl RelationalStore {
    pub(super) async fn find_by_key(&self, short_key: &str) -> Result<Lookup> {
        let db = &self.db;

        let model = retry_read("find_by_key", self.retry_policy, || async {
            url_record::Entity::find()
                .filter(url_record::Column::ShortUrl.eq(short_key))
                .one(db)
                .await
        })
        .await
        .map_err(|e| db_error("查询短链接失败", e))?;

        Ok(model
            .map(|m| Lookup::from_record(&model_to_record(m)))
            .unwrap_or(Lookup::Missing))
    }

    pub(super) async fn find_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        let db = &self.db;

        let rows: Vec<(String, String)> = retry_read("find_by_owner", self.retry_policy, || async {
            url_record::Entity::find()
                .select_only()
                .column(url_record::Column::ShortUrl)
                .column(url_record::Column::OriginalUrl)
                .filter(url_record::Column::Owner.eq(owner))
                .filter(url_record::Column::IsDeleted.eq(false))
                .order_by_asc(url_record::Column::Id)
                .into_tuple::<(String, String)>()
                .all(db)
                .await
        })
        .await
        .map_err(|e| db_error("查询用户链接失败", e))?;

        debug!("Loaded {} urls for owner {}", rows.len(), owner);
        Ok(rows
            .into_iter()
            .map(|(short_key, original_url)| OwnedUrl {
                short_key,
                original_url,
            })
            .collect())
    }

    /// 某个 URL 当前有效记录的短码
    pub(super) async fn find_active_key(&self, original_url: &str) -> Result<Option<String>> {
        let db = &self.db;

        retry_read("find_active_key", self.retry_policy, || async {
            url_record::Entity::find()
                .select_only()
                .column(url_record::Column::ShortUrl)
                .filter(url_record::Column::OriginalUrl.eq(original_url))
                .filter(url_record::Column::IsDeleted.eq(false))
                .into_tuple::<String>()
                .one(db)
                .await
        })
        .await
        .map_err(|e| db_error("查询已有短链接失败", e))
    }

    /// 短码是否被任何记录占用（含已删除）
    pub(super) async fn key_exists(&self, short_key: &str) -> Result<bool> {
        let db = &self.db;

        let count = retry_read("key_exists", self.retry_policy, || async {
            url_record::Entity::find()
                .filter(url_record::Column::ShortUrl.eq(short_key))
                .count(db)
                .await
        })
        .await
        .map_err(|e| db_error("查询短码失败", e))?;

        Ok(count > 0)
    }

    pub(super) async fn count_active(&self) -> Result<StoreStats> {
        let db = &self.db;

        let urls = retry_read("count_urls", self.retry_policy, || async {
            url_record::Entity::find()
                .filter(url_record::Column::IsDeleted.eq(false))
                .count(db)
                .await
        })
        .await
        .map_err(|e| db_error("统计链接失败", e))?;

        // SELECT COUNT(*) FROM (SELECT DISTINCT owner ...)
        let owners = retry_read("count_owners", self.retry_policy, || async {
            url_record::Entity::find()
                .select_only()
                .column(url_record::Column::Owner)
                .filter(url_record::Column::IsDeleted.eq(false))
                .filter(url_record::Column::Owner.is_not_null())
                .distinct()
                .count(db)
                .await
        })
        .await
        .map_err(|e| db_error("统计用户失败", e))?;

        Ok(StoreStats { urls, owners })
    }
}

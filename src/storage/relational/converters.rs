use chrono::Utc;

use crate::storage::models::UrlRecord;
use migration::entities::url_record;

/// 将 Sea-ORM Model 转换为 UrlRecord
pub fn model_to_record(model: url_record::Model) -> UrlRecord {
    UrlRecord {
        id: model.id.to_string(),
        short_key: model.short_url,
        original_url: model.original_url,
        owner: model.owner,
        deleted: model.is_deleted,
        created_at: model.created_at,
    }
}

/// 构造新记录的 ActiveModel，id 由数据库自增生成
pub fn new_active_model(
    short_key: &str,
    original_url: &str,
    owner: Option<&str>,
) -> url_record::ActiveModel {
    use sea_orm::ActiveValue::*;

    url_record::ActiveModel {
        id: NotSet,
        owner: Set(owner.map(str::to_string)),
        short_url: Set(short_key.to_string()),
        original_url: Set(original_url.to_string()),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
    }
}

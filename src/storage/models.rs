use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 持久化的 URL 记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// 内部 id（内存/文件后端为 UUID，关系型后端为自增主键）
    pub id: String,
    pub short_key: String,
    pub original_url: String,
    pub owner: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl UrlRecord {
    /// 新建一条有效记录，内部 id 为 UUID v4
    pub fn new(short_key: &str, original_url: &str, owner: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            short_key: short_key.to_string(),
            original_url: original_url.to_string(),
            owner: owner.map(str::to_string),
            deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }
}

/// insert 的结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

/// insert 返回的规范短码（可能是已有记录的短码）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inserted {
    pub short_key: String,
    pub outcome: InsertOutcome,
}

impl Inserted {
    pub fn created(short_key: impl Into<String>) -> Self {
        Self {
            short_key: short_key.into(),
            outcome: InsertOutcome::Created,
        }
    }

    pub fn already_exists(short_key: impl Into<String>) -> Self {
        Self {
            short_key: short_key.into(),
            outcome: InsertOutcome::AlreadyExists,
        }
    }

    pub fn is_created(&self) -> bool {
        self.outcome == InsertOutcome::Created
    }
}

/// read 的结果：找到（有效）、找到（已软删除）、不存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Active(String),
    Deleted(String),
    Missing,
}

impl Lookup {
    pub fn found(&self) -> bool {
        !matches!(self, Lookup::Missing)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Lookup::Deleted(_))
    }

    pub fn original_url(&self) -> Option<&str> {
        match self {
            Lookup::Active(url) | Lookup::Deleted(url) => Some(url),
            Lookup::Missing => None,
        }
    }

    pub(crate) fn from_record(record: &UrlRecord) -> Self {
        if record.deleted {
            Lookup::Deleted(record.original_url.clone())
        } else {
            Lookup::Active(record.original_url.clone())
        }
    }
}

/// 某个 owner 名下的有效链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUrl {
    pub short_key: String,
    pub original_url: String,
}

/// 统计：有效记录数与拥有有效记录的不同 owner 数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub urls: u64,
    pub owners: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(deleted: bool) -> UrlRecord {
        UrlRecord {
            id: "1".to_string(),
            short_key: "abcd1234".to_string(),
            original_url: "https://example.com".to_string(),
            owner: Some("u1".to_string()),
            deleted,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_lookup_from_record() {
        let active = Lookup::from_record(&record(false));
        assert!(active.found());
        assert!(!active.is_deleted());
        assert_eq!(active.original_url(), Some("https://example.com"));

        let deleted = Lookup::from_record(&record(true));
        assert!(deleted.found());
        assert!(deleted.is_deleted());
    }

    #[test]
    fn test_lookup_missing() {
        assert!(!Lookup::Missing.found());
        assert!(!Lookup::Missing.is_deleted());
        assert_eq!(Lookup::Missing.original_url(), None);
    }

    #[test]
    fn test_ownership() {
        let r = record(false);
        assert!(r.is_owned_by("u1"));
        assert!(!r.is_owned_by("u2"));

        let anonymous = UrlRecord { owner: None, ..r };
        assert!(!anonymous.is_owned_by("u1"));
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&InsertOutcome::AlreadyExists).unwrap();
        assert_eq!(json, "\"already_exists\"");
    }
}

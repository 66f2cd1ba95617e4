//! In-memory URL index shared by the memory and file backends
//!
//! Holds every record ever created (soft-deleted ones included, so their
//! short keys are never handed out again) plus a reverse map from original
//! URL to the short key of its active record. Callers wrap the index in a
//! single `RwLock` and do check-then-insert under the write guard.

use std::collections::{HashMap, HashSet};

use super::models::{Lookup, OwnedUrl, StoreStats, UrlRecord};

/// 候选短码的准入结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    /// 该 URL 已有有效记录
    Existing(String),
    /// 候选短码已被占用（含已删除记录）
    Collision,
    Vacant,
}

#[derive(Debug, Default)]
pub(crate) struct UrlIndex {
    records: HashMap<String, UrlRecord>,
    active_by_url: HashMap<String, String>,
}

impl UrlIndex {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn admit(&self, candidate_key: &str, original_url: &str) -> Admission {
        if let Some(existing) = self.active_by_url.get(original_url) {
            return Admission::Existing(existing.clone());
        }
        if self.records.contains_key(candidate_key) {
            return Admission::Collision;
        }
        Admission::Vacant
    }

    pub fn get(&self, short_key: &str) -> Option<&UrlRecord> {
        self.records.get(short_key)
    }

    pub fn lookup(&self, short_key: &str) -> Lookup {
        self.records
            .get(short_key)
            .map(Lookup::from_record)
            .unwrap_or(Lookup::Missing)
    }

    /// 调用方必须先通过 `admit` 确认 Vacant
    pub fn put(&mut self, record: UrlRecord) {
        if record.is_active() {
            self.active_by_url
                .insert(record.original_url.clone(), record.short_key.clone());
        }
        self.records.insert(record.short_key.clone(), record);
    }

    /// 返回 owner 可以删除的短码（有效、属于 owner、去重，保持输入顺序）
    pub fn deletable(&self, owner: &str, short_keys: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        short_keys
            .iter()
            .filter(|key| seen.insert(key.as_str()))
            .filter(|key| {
                self.records
                    .get(key.as_str())
                    .is_some_and(|r| r.is_active() && r.is_owned_by(owner))
            })
            .cloned()
            .collect()
    }

    /// 标记为已删除；记录不存在或已删除时返回 false
    pub fn mark_deleted(&mut self, short_key: &str) -> bool {
        let Some(record) = self.records.get_mut(short_key) else {
            return false;
        };
        if record.deleted {
            return false;
        }

        record.deleted = true;
        if self
            .active_by_url
            .get(&record.original_url)
            .is_some_and(|key| key == short_key)
        {
            self.active_by_url.remove(&record.original_url);
        }
        true
    }

    pub fn owned_by(&self, owner: &str) -> Vec<OwnedUrl> {
        let mut owned: Vec<&UrlRecord> = self
            .records
            .values()
            .filter(|r| r.is_active() && r.is_owned_by(owner))
            .collect();
        owned.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.short_key.cmp(&b.short_key))
        });

        owned
            .into_iter()
            .map(|r| OwnedUrl {
                short_key: r.short_key.clone(),
                original_url: r.original_url.clone(),
            })
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let mut owners = HashSet::new();
        let mut urls = 0u64;
        for record in self.records.values().filter(|r| r.is_active()) {
            urls += 1;
            if let Some(owner) = record.owner.as_deref() {
                owners.insert(owner);
            }
        }

        StoreStats {
            urls,
            owners: owners.len() as u64,
        }
    }
}

//! Append-only file backend
//!
//! The in-memory [`UrlIndex`] answers every read. Each successful insert and
//! each soft delete appends one JSON line to the log while the write lock is
//! held; on open the log is replayed in file order. Deletions are written as
//! tombstone lines (`"is_deleted": true`) for an existing short key.
//!
//! ```text
//! {"uuid":"…","short_url":"abcd1234","original_url":"https://example.com","owner":"u1","created_at":"…"}
//! {"uuid":"…","short_url":"abcd1234","original_url":"https://example.com","owner":"u1","is_deleted":true}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{UrlStore, ensure_valid_key};
use super::index::{Admission, UrlIndex};
use super::models::{Inserted, Lookup, OwnedUrl, StoreStats, UrlRecord};
use crate::errors::{LinkvaultError, Result};
use crate::utils::is_valid_short_key;

/// 日志文件中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub uuid: String,
    pub short_url: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deleted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl LogEntry {
    fn created(record: &UrlRecord) -> Self {
        Self {
            uuid: record.id.clone(),
            short_url: record.short_key.clone(),
            original_url: record.original_url.clone(),
            owner: record.owner.clone(),
            created_at: Some(record.created_at),
            is_deleted: false,
        }
    }

    fn tombstone(record: &UrlRecord) -> Self {
        Self {
            uuid: record.id.clone(),
            short_url: record.short_key.clone(),
            original_url: record.original_url.clone(),
            owner: record.owner.clone(),
            created_at: None,
            is_deleted: true,
        }
    }

    fn into_record(self) -> UrlRecord {
        UrlRecord {
            id: self.uuid,
            short_key: self.short_url,
            original_url: self.original_url,
            owner: self.owner,
            deleted: false,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 回放统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub applied: usize,
    pub skipped: usize,
}

/// 按文件顺序回放日志；坏行与违反唯一性的行记录 warn 后跳过
pub(crate) fn replay(content: &[u8]) -> (UrlIndex, ReplayStats) {
    let mut index = UrlIndex::default();
    let mut stats = ReplayStats::default();

    for (n, raw) in content.split(|b| *b == b'\n').enumerate() {
        let line_no = n + 1;
        let Ok(line) = std::str::from_utf8(raw) else {
            warn!("Skipping log line {}: not valid UTF-8", line_no);
            stats.skipped += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let entry: LogEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping malformed log line {}: {}", line_no, e);
                stats.skipped += 1;
                continue;
            }
        };

        if !is_valid_short_key(&entry.short_url) {
            warn!(
                "Skipping log line {}: invalid short key {:?}",
                line_no, entry.short_url
            );
            stats.skipped += 1;
            continue;
        }

        if entry.is_deleted {
            if index.get(&entry.short_url).is_none() {
                warn!(
                    "Skipping log line {}: tombstone for unknown key {}",
                    line_no, entry.short_url
                );
                stats.skipped += 1;
                continue;
            }
            index.mark_deleted(&entry.short_url);
            stats.applied += 1;
            continue;
        }

        match index.admit(&entry.short_url, &entry.original_url) {
            Admission::Vacant => {
                index.put(entry.into_record());
                stats.applied += 1;
            }
            Admission::Existing(key) => {
                warn!(
                    "Skipping log line {}: {} is already active under {}",
                    line_no, entry.original_url, key
                );
                stats.skipped += 1;
            }
            Admission::Collision => {
                warn!(
                    "Skipping log line {}: duplicate short key {}",
                    line_no, entry.short_url
                );
                stats.skipped += 1;
            }
        }
    }

    (index, stats)
}

struct FileState {
    index: UrlIndex,
    log: File,
}

pub struct FileStore {
    path: PathBuf,
    state: RwLock<FileState>,
}

impl FileStore {
    /// 打开（不存在则创建）日志文件并回放
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                LinkvaultError::file_operation(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Log file {} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(LinkvaultError::file_operation(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let (index, stats) = replay(&content);

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LinkvaultError::file_operation(format!(
                    "Failed to open {}: {}",
                    path.display(),
                    e
                ))
            })?;

        // 上次写入中断留下的半行，补换行避免与下一条粘连
        if content.last().is_some_and(|b| *b != b'\n') {
            log.write_all(b"\n")?;
        }

        info!(
            "File storage initialized from {}: {} entries applied, {} skipped, {} records",
            path.display(),
            stats.applied,
            stats.skipped,
            index.len()
        );

        Ok(Self {
            path,
            state: RwLock::new(FileState { index, log }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, log: &mut File, entries: &[LogEntry]) -> Result<()> {
        let mut buf = String::new();
        for entry in entries {
            buf.push_str(&serde_json::to_string(entry)?);
            buf.push('\n');
        }

        log.write_all(buf.as_bytes())
            .and_then(|_| log.flush())
            .map_err(|e| {
                LinkvaultError::file_operation(format!(
                    "Failed to append to {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl UrlStore for FileStore {
    async fn insert(
        &self,
        candidate_key: &str,
        original_url: &str,
        owner: Option<&str>,
    ) -> Result<Inserted> {
        // 回放会丢弃非法短码，写入前就拒绝
        ensure_valid_key(candidate_key)?;
        let mut state = self.state.write();
        let FileState { index, log } = &mut *state;

        match index.admit(candidate_key, original_url) {
            Admission::Existing(key) => Ok(Inserted::already_exists(key)),
            Admission::Collision => Err(LinkvaultError::key_collision(format!(
                "short key already taken: {}",
                candidate_key
            ))),
            Admission::Vacant => {
                let record = UrlRecord::new(candidate_key, original_url, owner);
                // 先落盘再更新索引，追加失败时索引保持不变
                self.append(log, &[LogEntry::created(&record)])?;
                index.put(record);
                debug!("Short key created: {}", candidate_key);
                Ok(Inserted::created(candidate_key))
            }
        }
    }

    async fn read(&self, short_key: &str) -> Result<Lookup> {
        Ok(self.state.read().index.lookup(short_key))
    }

    async fn read_all_by_owner(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        Ok(self.state.read().index.owned_by(owner))
    }

    async fn soft_delete_batch(&self, owner: &str, short_keys: &[String]) -> Result<()> {
        let mut state = self.state.write();
        let FileState { index, log } = &mut *state;

        let targets = index.deletable(owner, short_keys);
        if targets.is_empty() {
            return Ok(());
        }

        let tombstones: Vec<LogEntry> = targets
            .iter()
            .filter_map(|key| index.get(key))
            .map(LogEntry::tombstone)
            .collect();
        self.append(log, &tombstones)?;

        for key in &targets {
            index.mark_deleted(key);
        }

        debug!(
            "Soft-deleted {}/{} keys for owner {}",
            targets.len(),
            short_keys.len(),
            owner
        );
        Ok(())
    }

    async fn count(&self) -> Result<StoreStats> {
        Ok(self.state.read().index.stats())
    }

    async fn ping(&self) -> Result<()> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(LinkvaultError::file_operation(format!(
                "log file {} is missing",
                self.path.display()
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

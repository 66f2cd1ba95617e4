//! Batch soft-delete pipeline
//!
//! Keys are de-duplicated, split into fixed-size batches and pushed onto a
//! shared queue. A small pool of tokio tasks drains the queue, each calling
//! [`UrlStore::soft_delete_batch`] once per batch, and reports every batch
//! result to a single sink. The call returns after all workers finish.
//!
//! This is best effort, not a transaction: a failed batch does not undo
//! batches other workers already committed, and the first error reported
//! wins.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::DeleterConfig;
use crate::errors::{LinkvaultError, Result};
use crate::storage::UrlStore;

/// 成功时的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// 去重后的短码数
    pub requested: usize,
    pub batches: usize,
}

/// worker 发往汇聚端的单批结果
struct BatchReport {
    worker: usize,
    size: usize,
    result: Result<()>,
}

pub struct BatchDeleter {
    store: Arc<dyn UrlStore>,
    batch_size: usize,
    workers: usize,
}

impl BatchDeleter {
    pub fn new(store: Arc<dyn UrlStore>, config: &DeleterConfig) -> Self {
        Self::with_limits(store, config.batch_size, config.workers)
    }

    pub fn with_limits(store: Arc<dyn UrlStore>, batch_size: usize, workers: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            workers: workers.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 软删除 owner 名下的一组短码
    ///
    /// 不属于 owner 的短码由后端静默跳过。任一批次失败时返回第一个错误，
    /// 其余批次照常执行。
    pub async fn delete(&self, owner: &str, short_keys: &[String]) -> Result<DeleteSummary> {
        let mut seen = HashSet::with_capacity(short_keys.len());
        let unique: Vec<String> = short_keys
            .iter()
            .filter(|key| seen.insert(key.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(DeleteSummary::default());
        }

        let (queue_tx, queue_rx) = crossbeam_channel::unbounded::<Vec<String>>();
        let mut batches = 0;
        for chunk in unique.chunks(self.batch_size) {
            // queue_rx 仍在作用域内，发送不会失败
            let _ = queue_tx.send(chunk.to_vec());
            batches += 1;
        }
        drop(queue_tx);

        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<BatchReport>();
        let mut workers = JoinSet::new();

        for worker in 0..self.workers.min(batches) {
            let queue = queue_rx.clone();
            let sink = sink_tx.clone();
            let store = Arc::clone(&self.store);
            let owner = owner.to_string();

            workers.spawn(async move {
                while let Ok(batch) = queue.try_recv() {
                    let result = store.soft_delete_batch(&owner, &batch).await;
                    let report = BatchReport {
                        worker,
                        size: batch.len(),
                        result,
                    };
                    if sink.send(report).is_err() {
                        break;
                    }
                }
            });
        }
        drop(sink_tx);
        drop(queue_rx);

        let mut first_error: Option<LinkvaultError> = None;
        let mut failed_batches = 0;
        let mut reported = 0;

        while let Some(report) = sink_rx.recv().await {
            reported += 1;
            match report.result {
                Ok(()) => debug!(
                    "Worker {} deleted batch of {} keys for {}",
                    report.worker, report.size, owner
                ),
                Err(e) => {
                    warn!(
                        "Worker {} failed batch of {} keys for {}: {}",
                        report.worker, report.size, owner, e
                    );
                    failed_batches += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Delete worker aborted: {}", e);
                first_error.get_or_insert_with(|| {
                    LinkvaultError::database_operation(format!("delete worker aborted: {}", e))
                });
            }
        }

        if let Some(e) = first_error {
            warn!(
                "Batch delete for {} finished with {}/{} failed batches",
                owner,
                failed_batches + (batches - reported),
                batches
            );
            return Err(e);
        }

        info!(
            "Batch delete for {}: {} keys in {} batches",
            owner,
            unique.len(),
            batches
        );
        Ok(DeleteSummary {
            requested: unique.len(),
            batches,
        })
    }
}

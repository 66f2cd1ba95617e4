use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::storage::{StoreStats, UrlStore};

/// 只读统计
pub struct StatisticsReader {
    store: Arc<dyn UrlStore>,
}

impl StatisticsReader {
    pub fn new(store: Arc<dyn UrlStore>) -> Self {
        Self { store }
    }

    /// 有效记录数与拥有有效记录的 owner 数
    pub async fn snapshot(&self) -> Result<StoreStats> {
        let stats = self.store.count().await?;
        debug!(
            "Stats from {}: {} urls, {} owners",
            self.store.backend_name(),
            stats.urls,
            stats.owners
        );
        Ok(stats)
    }
}

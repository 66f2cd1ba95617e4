use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, trace};

use crate::storage::UrlStore;

/// 健康检查的默认超时
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub backend: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

pub struct HealthService;

impl HealthService {
    pub async fn check(store: &dyn UrlStore) -> HealthReport {
        Self::check_with_timeout(store, HEALTH_CHECK_TIMEOUT).await
    }

    pub async fn check_with_timeout(store: &dyn UrlStore, timeout: Duration) -> HealthReport {
        let start_time = Instant::now();
        trace!("Running storage health check");

        let error = match tokio::time::timeout(timeout, store.ping()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                Some(e.to_string())
            }
            Err(_) => {
                error!("Storage health check timeout");
                Some(format!("timeout after {} ms", timeout.as_millis()))
            }
        };

        HealthReport {
            backend: store.backend_name().to_string(),
            healthy: error.is_none(),
            latency_ms: start_time.elapsed().as_millis() as u64,
            error,
            checked_at: Utc::now(),
        }
    }
}

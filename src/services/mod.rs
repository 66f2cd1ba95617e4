//! Services layered over a [`UrlStore`](crate::storage::UrlStore)

pub mod deleter;
pub mod health;
pub mod shortener;
pub mod statistics;

pub use deleter::{BatchDeleter, DeleteSummary};
pub use health::{HealthReport, HealthService};
pub use shortener::{BatchItem, BatchResult, ShortenerService};
pub use statistics::StatisticsReader;

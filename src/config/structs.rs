use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::BackendKind;

/// 环境变量前缀，分隔符为 `__`，例如 `LV__STORAGE__DATABASE_URL`
pub const ENV_PREFIX: &str = "LV";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - storage: 存储后端选择
/// - database: 关系型后端的连接池、超时与重试
/// - identity: 身份令牌签名密钥
/// - shortener: 短码生成
/// - deleter: 批量删除流水线
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub deleter: DeleterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML 文件 > 默认值。显式给出的路径必须存在；
    /// 默认的 `config.toml` 缺失时只使用默认值和环境变量。
    pub fn load(path: Option<&str>) -> crate::errors::Result<Self> {
        if let Some(explicit) = path
            && !std::path::Path::new(explicit).exists()
        {
            return Err(crate::errors::LinkvaultError::config(format!(
                "Config file not found: {}",
                explicit
            )));
        }

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        let config = Self::try_load(path)?;
        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 解析 TOML 文件（可以不存在）并叠加环境变量
    pub fn try_load(path: &str) -> crate::errors::Result<Self> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                crate::errors::LinkvaultError::config(format!("Failed to build config: {}", e))
            })?;

        settings.try_deserialize::<StaticConfig>().map_err(|e| {
            crate::errors::LinkvaultError::config(format!("Failed to deserialize config: {}", e))
        })
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 存储后端选择
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// 数据库连接串，非空时优先使用关系型后端
    #[serde(default)]
    pub database_url: String,
    /// 追加日志文件路径，database_url 为空时生效
    #[serde(default)]
    pub file_path: String,
}

impl StorageConfig {
    /// 解析后端类型：数据库连接串 > 文件路径 > 内存
    pub fn backend_kind(&self) -> BackendKind {
        let database_url = self.database_url.trim();
        let file_path = self.file_path.trim();

        if !database_url.is_empty() {
            BackendKind::Relational(database_url.to_string())
        } else if !file_path.is_empty() {
            BackendKind::File(PathBuf::from(file_path))
        } else {
            BackendKind::Memory
        }
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 单次调用的硬超时
    #[serde(default = "default_database_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 身份令牌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// HMAC 密钥，为空时启动时随机生成
    #[serde(default)]
    pub secret_key: String,
    /// 令牌有效期（天），`IdentityCodec::is_expired` 按它判断
    #[serde(default = "default_token_max_age_days")]
    pub token_max_age_days: u32,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    #[serde(default = "default_key_length")]
    pub key_length: usize,
    /// 候选短码撞车时的最大尝试次数
    #[serde(default = "default_max_key_attempts")]
    pub max_key_attempts: u32,
}

/// 批量删除流水线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleterConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default)]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout_ms() -> u64 {
    5000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_token_max_age_days() -> u32 {
    30
}

fn default_key_length() -> usize {
    8
}

fn default_max_key_attempts() -> u32 {
    5
}

fn default_batch_size() -> usize {
    100
}

fn default_workers() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pool_size: default_database_pool_size(),
            timeout_ms: default_database_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            token_max_age_days: default_token_max_age_days(),
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            key_length: default_key_length(),
            max_key_attempts: default_max_key_attempts(),
        }
    }
}

impl Default for DeleterConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            workers: default_workers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.shortener.key_length, 8);
        assert_eq!(config.deleter.batch_size, 100);
        assert_eq!(config.deleter.workers, 4);
        assert_eq!(config.database.timeout_ms, 5000);
        assert_eq!(config.identity.token_max_age_days, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_backend_kind_defaults_to_memory() {
        let storage = StorageConfig::default();
        assert_eq!(storage.backend_kind(), BackendKind::Memory);
    }

    #[test]
    fn test_backend_kind_file_over_memory() {
        let storage = StorageConfig {
            database_url: String::new(),
            file_path: "links.jsonl".to_string(),
        };
        assert_eq!(
            storage.backend_kind(),
            BackendKind::File(PathBuf::from("links.jsonl"))
        );
    }

    #[test]
    fn test_backend_kind_database_wins() {
        let storage = StorageConfig {
            database_url: "sqlite://links.db".to_string(),
            file_path: "links.jsonl".to_string(),
        };
        assert_eq!(
            storage.backend_kind(),
            BackendKind::Relational("sqlite://links.db".to_string())
        );
    }

    #[test]
    fn test_backend_kind_ignores_blank_values() {
        let storage = StorageConfig {
            database_url: "   ".to_string(),
            file_path: "".to_string(),
        };
        assert_eq!(storage.backend_kind(), BackendKind::Memory);
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.deleter.batch_size, 100);
        assert_eq!(parsed.shortener.key_length, 8);
    }
}

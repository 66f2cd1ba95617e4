use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkvaultError {
    Config(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Gone(String),
    KeyCollision(String),
    Serialization(String),
    Timeout(String),
}

impl LinkvaultError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkvaultError::Config(_) => "E001",
            LinkvaultError::DatabaseConfig(_) => "E002",
            LinkvaultError::DatabaseConnection(_) => "E003",
            LinkvaultError::DatabaseOperation(_) => "E004",
            LinkvaultError::FileOperation(_) => "E005",
            LinkvaultError::Validation(_) => "E006",
            LinkvaultError::NotFound(_) => "E007",
            LinkvaultError::Gone(_) => "E008",
            LinkvaultError::KeyCollision(_) => "E009",
            LinkvaultError::Serialization(_) => "E010",
            LinkvaultError::Timeout(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkvaultError::Config(_) => "Configuration Error",
            LinkvaultError::DatabaseConfig(_) => "Database Configuration Error",
            LinkvaultError::DatabaseConnection(_) => "Database Connection Error",
            LinkvaultError::DatabaseOperation(_) => "Database Operation Error",
            LinkvaultError::FileOperation(_) => "File Operation Error",
            LinkvaultError::Validation(_) => "Validation Error",
            LinkvaultError::NotFound(_) => "Resource Not Found",
            LinkvaultError::Gone(_) => "Resource Gone",
            LinkvaultError::KeyCollision(_) => "Short Key Collision",
            LinkvaultError::Serialization(_) => "Serialization Error",
            LinkvaultError::Timeout(_) => "Timeout",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkvaultError::Config(msg)
            | LinkvaultError::DatabaseConfig(msg)
            | LinkvaultError::DatabaseConnection(msg)
            | LinkvaultError::DatabaseOperation(msg)
            | LinkvaultError::FileOperation(msg)
            | LinkvaultError::Validation(msg)
            | LinkvaultError::NotFound(msg)
            | LinkvaultError::Gone(msg)
            | LinkvaultError::KeyCollision(msg)
            | LinkvaultError::Serialization(msg)
            | LinkvaultError::Timeout(msg) => msg,
        }
    }

    /// 存储介质不可用（连接断开、I/O 失败、超时），调用方应视为硬失败
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            LinkvaultError::DatabaseConnection(_)
                | LinkvaultError::FileOperation(_)
                | LinkvaultError::Timeout(_)
        )
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    #[cfg(feature = "cli")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkvaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkvaultError {}

// 便捷的构造函数
impl LinkvaultError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::Config(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::NotFound(msg.into())
    }

    pub fn gone<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::Gone(msg.into())
    }

    pub fn key_collision<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::KeyCollision(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::Serialization(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        LinkvaultError::Timeout(msg.into())
    }
}

impl From<sea_orm::DbErr> for LinkvaultError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                LinkvaultError::DatabaseConnection(err.to_string())
            }
            other => LinkvaultError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for LinkvaultError {
    fn from(err: std::io::Error) -> Self {
        LinkvaultError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkvaultError {
    fn from(err: serde_json::Error) -> Self {
        LinkvaultError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkvaultError>;

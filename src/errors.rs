use std::fmt;

#[derive(Debug, Clone)]
pub enum AfftrackError {
    Validation(String),
    Authorization(String),
    GoalNotFound(String),
    NotFound(String),
    InvalidTransition(String),
    UnknownStatusLabel(String),
    BrokerUnavailable(String),
    FraudDetected(String),
    BrokerGateway(String),
    CacheConnection(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
}

impl AfftrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AfftrackError::Validation(_) => "E001",
            AfftrackError::Authorization(_) => "E002",
            AfftrackError::GoalNotFound(_) => "E003",
            AfftrackError::NotFound(_) => "E004",
            AfftrackError::InvalidTransition(_) => "E005",
            AfftrackError::UnknownStatusLabel(_) => "E006",
            AfftrackError::BrokerUnavailable(_) => "E007",
            AfftrackError::FraudDetected(_) => "E008",
            AfftrackError::BrokerGateway(_) => "E009",
            AfftrackError::CacheConnection(_) => "E010",
            AfftrackError::DatabaseConfig(_) => "E011",
            AfftrackError::DatabaseConnection(_) => "E012",
            AfftrackError::DatabaseOperation(_) => "E013",
            AfftrackError::Serialization(_) => "E014",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AfftrackError::Validation(_) => "Validation Error",
            AfftrackError::Authorization(_) => "Authorization Error",
            AfftrackError::GoalNotFound(_) => "Goal Not Found",
            AfftrackError::NotFound(_) => "Resource Not Found",
            AfftrackError::InvalidTransition(_) => "Invalid Status Transition",
            AfftrackError::UnknownStatusLabel(_) => "Unknown Status Label",
            AfftrackError::BrokerUnavailable(_) => "Broker Unavailable",
            AfftrackError::FraudDetected(_) => "Fraud Detected",
            AfftrackError::BrokerGateway(_) => "Broker Gateway Error",
            AfftrackError::CacheConnection(_) => "Cache Connection Error",
            AfftrackError::DatabaseConfig(_) => "Database Configuration Error",
            AfftrackError::DatabaseConnection(_) => "Database Connection Error",
            AfftrackError::DatabaseOperation(_) => "Database Operation Error",
            AfftrackError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AfftrackError::Validation(msg) => msg,
            AfftrackError::Authorization(msg) => msg,
            AfftrackError::GoalNotFound(msg) => msg,
            AfftrackError::NotFound(msg) => msg,
            AfftrackError::InvalidTransition(msg) => msg,
            AfftrackError::UnknownStatusLabel(msg) => msg,
            AfftrackError::BrokerUnavailable(msg) => msg,
            AfftrackError::FraudDetected(msg) => msg,
            AfftrackError::BrokerGateway(msg) => msg,
            AfftrackError::CacheConnection(msg) => msg,
            AfftrackError::DatabaseConfig(msg) => msg,
            AfftrackError::DatabaseConnection(msg) => msg,
            AfftrackError::DatabaseOperation(msg) => msg,
            AfftrackError::Serialization(msg) => msg,
        }
    }

    /// 判断是否属于预期的业务结果错误（记录 info 而不是 error）
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            AfftrackError::BrokerUnavailable(_) | AfftrackError::FraudDetected(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
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

impl fmt::Display for AfftrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AfftrackError {}

// 便捷的构造函数
impl AfftrackError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AfftrackError::Validation(msg.into())
    }

    pub fn authorization<T: Into<String>>(msg: T) -> Self {
        AfftrackError::Authorization(msg.into())
    }

    pub fn goal_not_found<T: Into<String>>(msg: T) -> Self {
        AfftrackError::GoalNotFound(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AfftrackError::NotFound(msg.into())
    }

    pub fn invalid_transition<T: Into<String>>(msg: T) -> Self {
        AfftrackError::InvalidTransition(msg.into())
    }

    pub fn unknown_status_label<T: Into<String>>(msg: T) -> Self {
        AfftrackError::UnknownStatusLabel(msg.into())
    }

    pub fn broker_unavailable<T: Into<String>>(msg: T) -> Self {
        AfftrackError::BrokerUnavailable(msg.into())
    }

    pub fn fraud_detected<T: Into<String>>(msg: T) -> Self {
        AfftrackError::FraudDetected(msg.into())
    }

    pub fn broker_gateway<T: Into<String>>(msg: T) -> Self {
        AfftrackError::BrokerGateway(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        AfftrackError::CacheConnection(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AfftrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AfftrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AfftrackError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AfftrackError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AfftrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        AfftrackError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AfftrackError {
    fn from(err: serde_json::Error) -> Self {
        AfftrackError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for AfftrackError {
    fn from(err: redis::RedisError) -> Self {
        AfftrackError::CacheConnection(err.to_string())
    }
}

impl From<reqwest::Error> for AfftrackError {
    fn from(err: reqwest::Error) -> Self {
        AfftrackError::BrokerGateway(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AfftrackError>;

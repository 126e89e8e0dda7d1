// ==========================================
// Kumex 切割车间 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 配置缺陷: 对依赖它的计算是致命错误, 不作为 Issue 上报
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置常量无效 (field={field}): {message}")]
    InvalidConstant { field: String, message: String },

    #[error("配置文件读取失败: {0}")]
    ReadError(String),

    #[error("配置文件写入失败: {0}")]
    WriteError(String),

    #[error("配置序列化失败: {0}")]
    SerializeError(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidConstant {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::WriteError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::SerializeError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

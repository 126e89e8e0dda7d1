// ==========================================
// Kumex 切割车间 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository / Config 错误
// 锁定冲突: 类型化拒绝, 列出全部冲突月份, 不做任何变更
// ==========================================

use crate::config::error::ConfigError;
use crate::domain::types::YearMonth;
use crate::i18n;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 台账规则错误
    // ==========================================
    /// 请求期间包含已锁定月份
    #[error("月份已锁定: {}", join_months(.months))]
    LockConflict { months: Vec<YearMonth> },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 配置 / 存储错误
    // ==========================================
    #[error("配置错误: {0}")]
    InvalidConfig(String),

    #[error("存储错误: {0}")]
    StorageError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("报表写入失败: {0}")]
    ReportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向用户的本地化说明
    pub fn user_message(&self) -> String {
        match self {
            ApiError::LockConflict { months } => {
                i18n::t_with_args("lock.conflict", &[("months", &join_months(months))])
            }
            other => other.to_string(),
        }
    }
}

fn join_months(months: &[YearMonth]) -> String {
    months
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::StorageError(format!("台账锁获取失败: {}", msg))
            }
            RepositoryError::ReadError(msg)
            | RepositoryError::WriteError(msg)
            | RepositoryError::SerializeError(msg) => ApiError::StorageError(msg),

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::InvalidConfig(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

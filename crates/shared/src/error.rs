//! 基础设施错误类型
//!
//! 数据库连接、迁移、配置加载等基础设施层的错误，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, InfraError>;

impl InfraError {
    /// 是否为可重试错误
    ///
    /// 连接池超时、网络 IO 等瞬时故障可重试；配置和迁移错误重试也不会恢复。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().is_some_and(|code| is_transient_sqlstate(&code))
            }
            Self::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

/// 服务端暂时不可用的 SQLSTATE
///
/// 53 类为资源不足（如 53300 连接数已满），57 类为运维干预（如 57P03 数据库正在启动）
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("53") || code.starts_with("57")
}

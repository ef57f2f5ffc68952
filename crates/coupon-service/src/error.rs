//! 优惠券服务错误类型
//!
//! - `CouponError`：Registry / Engine / 仓储层的业务与存储错误
//! - `ApiError`：HTTP 边界错误，负责选择状态码并渲染统一响应信封

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    /// 生成的 serial/code 与已有记录冲突，调用方可重新生成后重试
    #[error("序列号或兑换码冲突: {constraint}")]
    Collision { constraint: String },
}

/// 优惠券业务错误
#[derive(Debug, Error)]
pub enum CouponError {
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("优惠券不存在: {0}")]
    NotFound(i64),

    /// 不区分凭证不匹配、已使用、已过期或不存在，避免泄露凭证的哪一半有误
    #[error("优惠券不可用：不存在、已使用或已过期")]
    Redemption,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, CouponError>;

impl From<sqlx::Error> for CouponError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

impl From<validator::ValidationErrors> for CouponError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl CouponError {
    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "COUPON_NOT_FOUND",
            Self::Redemption => "REDEMPTION_FAILED",
            Self::Storage(StorageError::Collision { .. }) => "ID_COLLISION",
            Self::Storage(StorageError::Database(_)) => "DATABASE_ERROR",
        }
    }

    /// 是否为 serial/code 撞库
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Collision { .. }))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// HTTP 接口操作
///
/// 同一类业务错误在不同接口上返回的状态码不同，由操作决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateCoupon,
    DeleteCoupon,
    RetrieveCoupon,
    QueryCoupons,
    UseCoupon,
}

impl Operation {
    /// 操作失败时的 HTTP 状态码
    pub fn failure_status(&self) -> StatusCode {
        match self {
            // 查询详情不区分不存在与系统错误，保持既有接口约定
            Self::RetrieveCoupon => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CreateCoupon | Self::DeleteCoupon | Self::QueryCoupons | Self::UseCoupon => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCoupon => "create_coupon",
            Self::DeleteCoupon => "delete_coupon",
            Self::RetrieveCoupon => "retrieve_coupon",
            Self::QueryCoupons => "query_coupons",
            Self::UseCoupon => "use_coupon",
        }
    }
}

/// HTTP 边界错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 数据库未初始化，在任何业务逻辑之前检查
    #[error("数据库未初始化")]
    StoreUnavailable,

    #[error("请求体解析失败: {0}")]
    Parse(String),

    #[error("{source}")]
    Coupon {
        op: Operation,
        #[source]
        source: CouponError,
    },
}

impl ApiError {
    /// 生成把业务错误绑定到指定操作的转换函数
    ///
    /// ```ignore
    /// registry.delete(id).await.map_err(ApiError::on(Operation::DeleteCoupon))?;
    /// ```
    pub fn on(op: Operation) -> impl Fn(CouponError) -> ApiError {
        move |source| ApiError::Coupon { op, source }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Parse(_) => StatusCode::BAD_REQUEST,
            Self::Coupon { op, .. } => op.failure_status(),
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable => "DB_NOT_INITIALIZED",
            Self::Parse(_) => "PARSE_JSON_FAILED",
            Self::Coupon { source, .. } => source.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 数据库错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::StoreUnavailable => {
                tracing::warn!("Store is not initialized");
                self.to_string()
            }
            Self::Coupon {
                op,
                source: CouponError::Storage(StorageError::Database(e)),
            } => {
                tracing::error!(operation = op.name(), error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Coupon { op, source } => {
                tracing::warn!(operation = op.name(), error = %source, "请求处理失败");
                source.to_string()
            }
            Self::Parse(e) => {
                tracing::warn!(error = %e, "请求体解析失败");
                self.to_string()
            }
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl ApiError {
    /// 生成请求体拒绝的转换函数
    ///
    /// 语法正确但字段缺失或类型不符的 JSON 属于参数校验失败，按操作选择状态码；
    /// 其余（语法错误、缺少 Content-Type、读取失败）属于解析失败
    pub fn on_body(op: Operation) -> impl Fn(JsonRejection) -> ApiError {
        move |rejection| match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Coupon {
                op,
                source: CouponError::Validation(e.body_text()),
            },
            other => ApiError::Parse(other.body_text()),
        }
    }
}

/// 查询参数格式错误按列表查询失败处理
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Coupon {
            op: Operation::QueryCoupons,
            source: CouponError::Validation(rejection.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(CouponError::NotFound(1).error_code(), "COUPON_NOT_FOUND");
        assert_eq!(CouponError::Redemption.error_code(), "REDEMPTION_FAILED");
        assert_eq!(
            CouponError::Validation("kind".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            CouponError::from(sqlx::Error::PoolTimedOut).error_code(),
            "DATABASE_ERROR"
        );
        let collision = CouponError::Storage(StorageError::Collision {
            constraint: "coupons_serial_key".to_string(),
        });
        assert_eq!(collision.error_code(), "ID_COLLISION");
        assert!(collision.is_collision());
        assert!(!collision.is_business_error());
    }

    #[test]
    fn test_status_depends_on_operation() {
        let not_found = |op| ApiError::Coupon {
            op,
            source: CouponError::NotFound(7),
        };
        assert_eq!(
            not_found(Operation::DeleteCoupon).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            not_found(Operation::RetrieveCoupon).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::StoreUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Parse("eof".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_api_error_code() {
        assert_eq!(ApiError::StoreUnavailable.error_code(), "DB_NOT_INITIALIZED");
        assert_eq!(ApiError::Parse(String::new()).error_code(), "PARSE_JSON_FAILED");
        let err = ApiError::on(Operation::UseCoupon)(CouponError::Redemption);
        assert_eq!(err.error_code(), "REDEMPTION_FAILED");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_redemption_message_does_not_reveal_credential_half() {
        let message = CouponError::Redemption.to_string();
        assert!(!message.contains("serial"));
        assert!(!message.contains("code"));
    }
}

//! 优惠券枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 优惠券状态
///
/// 只允许 Unused -> Used 的单向流转
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum CouponStatus {
    /// 未使用
    #[default]
    Unused,
    /// 已使用
    Used,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }

    /// 宽松解析，未知值返回 None（列表过滤时忽略）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unused" => Some(Self::Unused),
            "used" => Some(Self::Used),
            _ => None,
        }
    }
}

/// 列表排序字段
///
/// 白名单校验，非法值回退到默认的创建时间，不报错
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    CreateTime,
    UseTime,
    Amount,
    Kind,
}

impl OrderBy {
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "createtime" | "create_time" => Self::CreateTime,
            "usetime" | "use_time" => Self::UseTime,
            "amount" => Self::Amount,
            "kind" => Self::Kind,
            _ => Self::default(),
        }
    }

    /// 对应的数据库列名，只可能是白名单内的常量
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreateTime => "create_time",
            Self::UseTime => "use_time",
            Self::Amount => "amount",
            Self::Kind => "kind",
        }
    }
}

/// 排序方向，默认倒序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Self::Asc,
            "desc" => Self::Desc,
            _ => Self::default(),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

//! 优惠券实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{CouponStatus, OrderBy, SortOrder};

/// 优惠券
///
/// serial 与 code 由服务端生成，二者同时匹配才能兑换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    /// 序列号（全局唯一，主要查找键）
    pub serial: String,
    /// 兑换码（全局唯一，与 serial 组成兑换凭证）
    pub code: String,
    /// 类型标签，用于列表过滤
    pub kind: String,
    /// 面额
    pub amount: f64,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 过期时间（为空表示永不过期）
    #[sqlx(default)]
    pub expire_on: Option<DateTime<Utc>>,
    pub status: CouponStatus,
    /// 兑换人
    #[sqlx(default)]
    pub username: Option<String>,
    /// 兑换目标账户
    #[sqlx(default)]
    pub namespace: Option<String>,
    pub create_time: DateTime<Utc>,
    /// 兑换时间，仅在 status = used 时存在
    #[sqlx(default)]
    pub use_time: Option<DateTime<Utc>>,
}

impl Coupon {
    /// 检查在给定时刻是否可兑换（未使用且未过期）
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Unused && self.expire_on.is_none_or(|expire| expire > now)
    }

    /// 检查 serial/code 凭证是否匹配
    pub fn matches(&self, serial: &str, code: &str) -> bool {
        self.serial == serial && self.code == code
    }
}

/// 待持久化的新优惠券
///
/// 由 Registry 构造，serial/code 已生成
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub serial: String,
    pub code: String,
    pub kind: String,
    pub amount: f64,
    pub description: Option<String>,
    pub expire_on: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

impl NewCoupon {
    /// 构造存储后的完整记录（内存存储使用）
    pub fn into_coupon(self, id: i64) -> Coupon {
        Coupon {
            id,
            serial: self.serial,
            code: self.code,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            expire_on: self.expire_on,
            status: CouponStatus::Unused,
            username: None,
            namespace: None,
            create_time: self.create_time,
            use_time: None,
        }
    }
}

/// 兑换信息
#[derive(Debug, Clone, PartialEq)]
pub struct UseInfo {
    pub serial: String,
    pub code: String,
    pub username: String,
    pub namespace: Option<String>,
    pub use_time: DateTime<Utc>,
}

/// 列表查询条件
///
/// offset/limit 已经过钳制，order_by/sort_order 已经过白名单校验
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponQuery {
    pub kind: Option<String>,
    pub status: Option<CouponStatus>,
    pub order_by: OrderBy,
    pub sort_order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

/// 列表查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    pub total: i64,
    pub items: Vec<Coupon>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expire_on: Option<DateTime<Utc>>) -> Coupon {
        NewCoupon {
            serial: "ABCDEFGHIJ".to_string(),
            code: "0123456789".to_string(),
            kind: "discount10".to_string(),
            amount: 10.0,
            description: None,
            expire_on,
            create_time: Utc::now(),
        }
        .into_coupon(1)
    }

    #[test]
    fn test_new_coupon_starts_unused() {
        let coupon = sample(None);
        assert_eq!(coupon.status, CouponStatus::Unused);
        assert!(coupon.use_time.is_none());
        assert!(coupon.username.is_none());
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        assert!(sample(None).is_redeemable(now));
        assert!(sample(Some(now + Duration::days(1))).is_redeemable(now));
        assert!(!sample(Some(now - Duration::seconds(1))).is_redeemable(now));

        let mut used = sample(None);
        used.status = CouponStatus::Used;
        used.use_time = Some(now);
        assert!(!used.is_redeemable(now));
    }

    #[test]
    fn test_matches_requires_both_halves() {
        let coupon = sample(None);
        assert!(coupon.matches("ABCDEFGHIJ", "0123456789"));
        assert!(!coupon.matches("ABCDEFGHIJ", "9999999999"));
        assert!(!coupon.matches("ZZZZZZZZZZ", "0123456789"));
    }

    #[test]
    fn test_coupon_serializes_camel_case() {
        let json = serde_json::to_value(sample(None)).unwrap();
        assert!(json.get("createTime").is_some());
        assert!(json.get("useTime").is_some());
        assert_eq!(json["status"], "unused");
    }
}

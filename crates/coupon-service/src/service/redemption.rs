//! 优惠券兑换引擎
//!
//! 兑换的判定与状态流转由存储层一次条件更新完成，引擎本身不持有锁。
//! 同一 (serial, code) 的并发兑换只有一个成功，其余均返回兑换失败。

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use coupon_shared::observability::metrics;

use crate::error::{CouponError, Result};
use crate::models::{Coupon, UseInfo};
use crate::repository::CouponRepository;

/// 兑换人信息
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionMetadata {
    #[validate(length(min = 1, max = 128, message = "用户名长度必须在1-128个字符之间"))]
    pub username: String,
    #[validate(length(max = 128, message = "命名空间不能超过128个字符"))]
    pub namespace: Option<String>,
}

/// 兑换引擎
pub struct RedemptionEngine {
    repo: Arc<dyn CouponRepository>,
}

impl RedemptionEngine {
    pub fn new(repo: Arc<dyn CouponRepository>) -> Self {
        Self { repo }
    }

    /// 兑换优惠券
    ///
    /// 凭证不匹配、不存在、已使用、已过期统一返回 `CouponError::Redemption`，且不修改任何记录
    #[instrument(skip(self, code, metadata), fields(username = %metadata.username))]
    pub async fn redeem(
        &self,
        serial: &str,
        code: &str,
        metadata: RedemptionMetadata,
    ) -> Result<Coupon> {
        metadata.validate()?;

        let started = Instant::now();
        let info = UseInfo {
            serial: serial.to_string(),
            code: code.to_string(),
            username: metadata.username,
            namespace: metadata.namespace,
            use_time: Utc::now(),
        };

        let outcome = self.repo.mark_used(&info).await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(Some(coupon)) => {
                metrics::record_redemption("success", elapsed);
                info!(coupon_id = coupon.id, serial = %coupon.serial, "优惠券兑换成功");
                Ok(coupon)
            }
            Ok(None) => {
                metrics::record_redemption("rejected", elapsed);
                warn!(serial = %serial, "优惠券兑换被拒绝");
                Err(CouponError::Redemption)
            }
            Err(err) => {
                metrics::record_redemption("error", elapsed);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CouponStatus, NewCoupon};
    use crate::repository::MockCouponRepository;

    fn metadata(username: &str) -> RedemptionMetadata {
        RedemptionMetadata {
            username: username.to_string(),
            namespace: Some("ns-1".to_string()),
        }
    }

    fn used_coupon(info: &UseInfo) -> Coupon {
        let mut coupon = NewCoupon {
            serial: info.serial.clone(),
            code: info.code.clone(),
            kind: "discount10".to_string(),
            amount: 10.0,
            description: None,
            expire_on: None,
            create_time: info.use_time,
        }
        .into_coupon(1);
        coupon.status = CouponStatus::Used;
        coupon.use_time = Some(info.use_time);
        coupon.username = Some(info.username.clone());
        coupon.namespace = info.namespace.clone();
        coupon
    }

    #[tokio::test]
    async fn test_redeem_success() {
        let mut repo = MockCouponRepository::new();
        repo.expect_mark_used()
            .withf(|info| info.serial == "SERIAL0001" && info.username == "alice")
            .times(1)
            .returning(|info| Ok(Some(used_coupon(info))));

        let engine = RedemptionEngine::new(Arc::new(repo));
        let coupon = engine
            .redeem("SERIAL0001", "CODE000001", metadata("alice"))
            .await
            .unwrap();

        assert_eq!(coupon.status, CouponStatus::Used);
        assert_eq!(coupon.namespace.as_deref(), Some("ns-1"));
    }

    #[tokio::test]
    async fn test_redeem_rejected_when_nothing_updated() {
        let mut repo = MockCouponRepository::new();
        repo.expect_mark_used().returning(|_| Ok(None));

        let engine = RedemptionEngine::new(Arc::new(repo));
        let err = engine
            .redeem("SERIAL0001", "WRONGCODE0", metadata("alice"))
            .await
            .unwrap_err();

        assert!(matches!(err, CouponError::Redemption));
    }

    #[tokio::test]
    async fn test_redeem_validates_metadata_first() {
        let mut repo = MockCouponRepository::new();
        repo.expect_mark_used().never();

        let engine = RedemptionEngine::new(Arc::new(repo));
        let err = engine
            .redeem("SERIAL0001", "CODE000001", metadata(""))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let mut long_namespace = metadata("alice");
        long_namespace.namespace = Some("n".repeat(129));
        let err = engine
            .redeem("SERIAL0001", "CODE000001", long_namespace)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_redeem_propagates_storage_error() {
        let mut repo = MockCouponRepository::new();
        repo.expect_mark_used()
            .returning(|_| Err(sqlx::Error::PoolClosed.into()));

        let engine = RedemptionEngine::new(Arc::new(repo));
        let err = engine
            .redeem("SERIAL0001", "CODE000001", metadata("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}

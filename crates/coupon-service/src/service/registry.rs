//! 优惠券登记服务
//!
//! 负责优惠券的创建、删除、详情与列表查询。
//! serial/code 始终由服务端生成，撞库时重新生成并有限次重试。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use coupon_shared::observability::metrics;

use super::code_generator::CodeGenerator;
use crate::error::{CouponError, Result};
use crate::models::{Coupon, CouponQuery, NewCoupon, QueryPage};
use crate::repository::CouponRepository;

/// 优惠券草稿（创建时的描述性字段）
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CouponDraft {
    #[validate(length(min = 1, max = 64, message = "类型长度必须在1-64个字符之间"))]
    pub kind: String,
    pub amount: f64,
    #[validate(length(max = 512, message = "描述不能超过512个字符"))]
    pub description: Option<String>,
    pub expire_on: Option<DateTime<Utc>>,
}

impl CouponDraft {
    /// 校验草稿，now 用于判断过期时间是否在未来
    pub fn check(&self, now: DateTime<Utc>) -> Result<()> {
        self.validate()?;

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CouponError::Validation("面额必须为大于0的有限数值".to_string()));
        }

        if let Some(expire_on) = self.expire_on {
            if expire_on <= now {
                return Err(CouponError::Validation("过期时间必须晚于当前时间".to_string()));
            }
        }

        Ok(())
    }
}

/// 优惠券登记服务
pub struct CouponRegistry {
    repo: Arc<dyn CouponRepository>,
    generator: Arc<dyn CodeGenerator>,
    max_create_attempts: u32,
}

impl CouponRegistry {
    pub fn new(
        repo: Arc<dyn CouponRepository>,
        generator: Arc<dyn CodeGenerator>,
        max_create_attempts: u32,
    ) -> Self {
        Self {
            repo,
            generator,
            max_create_attempts: max_create_attempts.max(1),
        }
    }

    /// 创建优惠券
    ///
    /// 唯一约束冲突时重新生成 serial 与 code，最多尝试 max_create_attempts 次
    #[instrument(skip(self, draft), fields(kind = %draft.kind))]
    pub async fn create(&self, draft: CouponDraft) -> Result<Coupon> {
        let now = Utc::now();
        draft.check(now)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let new_coupon = NewCoupon {
                serial: self.generator.generate(),
                code: self.generator.generate(),
                kind: draft.kind.clone(),
                amount: draft.amount,
                description: draft.description.clone(),
                expire_on: draft.expire_on,
                create_time: now,
            };

            match self.repo.insert(&new_coupon).await {
                Ok(coupon) => {
                    metrics::record_coupon_created(&coupon.kind);
                    info!(
                        coupon_id = coupon.id,
                        serial = %coupon.serial,
                        attempt,
                        "优惠券创建成功"
                    );
                    return Ok(coupon);
                }
                Err(err) if err.is_collision() => {
                    metrics::record_id_collision();
                    if attempt >= self.max_create_attempts {
                        warn!(attempt, error = %err, "serial/code 撞库，重试次数已用尽");
                        return Err(err);
                    }
                    warn!(attempt, error = %err, "serial/code 撞库，重新生成");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// 删除优惠券（物理删除）
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(CouponError::NotFound(id));
        }

        info!(coupon_id = id, "优惠券已删除");
        Ok(())
    }

    /// 获取优惠券详情
    #[instrument(skip(self))]
    pub async fn retrieve(&self, id: i64) -> Result<Coupon> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CouponError::NotFound(id))
    }

    /// 分页查询优惠券
    #[instrument(skip(self))]
    pub async fn list(&self, query: CouponQuery) -> Result<QueryPage> {
        self.repo.query(&query).await
    }
}

//! 仓储 Trait 定义
//!
//! 服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Coupon, CouponQuery, NewCoupon, QueryPage, UseInfo};

/// 优惠券仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// 插入新优惠券
    ///
    /// serial/code 违反唯一约束时返回 `StorageError::Collision`
    async fn insert(&self, coupon: &NewCoupon) -> Result<Coupon>;

    /// 删除优惠券，返回是否确实删除了记录
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Coupon>>;

    /// 分页查询，先排序后截取
    async fn query(&self, query: &CouponQuery) -> Result<QueryPage>;

    /// 条件更新：仅当 serial/code 匹配、状态为未使用且未过期时标记为已使用
    ///
    /// 判断与更新在同一原子操作中完成，并发调用中只有一个会返回 Some
    async fn mark_used(&self, info: &UseInfo) -> Result<Option<Coupon>>;

    async fn health_check(&self) -> Result<()>;
}

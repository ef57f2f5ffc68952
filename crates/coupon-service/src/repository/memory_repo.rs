//! 内存优惠券仓储
//!
//! 用于测试和本地调试，进程重启后数据丢失。
//! 所有写操作在同一把写锁内完成“检查 + 修改”，与数据库条件更新具有相同的原子性。

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::CouponRepository;
use crate::error::{Result, StorageError};
use crate::models::{Coupon, CouponQuery, NewCoupon, OrderBy, QueryPage, SortOrder, UseInfo};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    coupons: BTreeMap<i64, Coupon>,
}

/// 内存优惠券仓储
#[derive(Debug, Default)]
pub struct MemoryCouponRepository {
    inner: RwLock<Inner>,
}

impl MemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.inner.read().coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 按排序字段比较，use_time 为空的记录始终排在最后，相同值按 id 同向排序
fn compare(a: &Coupon, b: &Coupon, order_by: OrderBy, sort_order: SortOrder) -> Ordering {
    let directed = |ordering: Ordering| match sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    let primary = match order_by {
        OrderBy::CreateTime => directed(a.create_time.cmp(&b.create_time)),
        OrderBy::Amount => directed(a.amount.total_cmp(&b.amount)),
        OrderBy::Kind => directed(a.kind.cmp(&b.kind)),
        OrderBy::UseTime => match (a.use_time, b.use_time) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };

    primary.then_with(|| directed(a.id.cmp(&b.id)))
}

#[async_trait]
impl CouponRepository for MemoryCouponRepository {
    async fn insert(&self, coupon: &NewCoupon) -> Result<Coupon> {
        let mut inner = self.inner.write();

        for existing in inner.coupons.values() {
            if existing.serial == coupon.serial {
                return Err(StorageError::Collision {
                    constraint: "coupons_serial_key".to_string(),
                }
                .into());
            }
            if existing.code == coupon.code {
                return Err(StorageError::Collision {
                    constraint: "coupons_code_key".to_string(),
                }
                .into());
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let created = coupon.clone().into_coupon(id);
        inner.coupons.insert(id, created.clone());

        Ok(created)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.inner.write().coupons.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Coupon>> {
        Ok(self.inner.read().coupons.get(&id).cloned())
    }

    async fn query(&self, query: &CouponQuery) -> Result<QueryPage> {
        let inner = self.inner.read();

        let mut matched: Vec<&Coupon> = inner
            .coupons
            .values()
            .filter(|c| query.kind.as_deref().is_none_or(|kind| c.kind == kind))
            .filter(|c| query.status.is_none_or(|status| c.status == status))
            .collect();

        matched.sort_by(|a, b| compare(a, b, query.order_by, query.sort_order));

        let total = matched.len() as i64;
        let items = matched
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(QueryPage { total, items })
    }

    async fn mark_used(&self, info: &UseInfo) -> Result<Option<Coupon>> {
        let mut inner = self.inner.write();

        let Some(coupon) = inner
            .coupons
            .values_mut()
            .find(|c| c.matches(&info.serial, &info.code))
        else {
            return Ok(None);
        };

        if !coupon.is_redeemable(info.use_time) {
            return Ok(None);
        }

        coupon.status = crate::models::CouponStatus::Used;
        coupon.use_time = Some(info.use_time);
        coupon.username = Some(info.username.clone());
        coupon.namespace = info.namespace.clone();

        Ok(Some(coupon.clone()))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

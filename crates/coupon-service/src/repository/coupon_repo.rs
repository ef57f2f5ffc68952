//! 优惠券仓储（PostgreSQL）

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::traits::CouponRepository;
use crate::error::{Result, StorageError};
use crate::models::{Coupon, CouponQuery, NewCoupon, QueryPage, UseInfo};

const COUPON_COLUMNS: &str = "id, serial, code, kind, amount, description, expire_on, \
                              status, username, namespace, create_time, use_time";

/// 优惠券仓储
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 追加过滤条件，列表与计数共用
    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CouponQuery) {
        builder.push(" WHERE 1 = 1");
        if let Some(kind) = &query.kind {
            builder.push(" AND kind = ").push_bind(kind.clone());
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
    }
}

/// 唯一约束冲突转换为可重试的撞库错误
fn map_insert_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Collision {
                constraint: db_err.constraint().unwrap_or("unique").to_string(),
            };
        }
    }
    StorageError::Database(err)
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn insert(&self, coupon: &NewCoupon) -> Result<Coupon> {
        let sql = format!(
            r#"
            INSERT INTO coupons (serial, code, kind, amount, description, expire_on,
                                 status, create_time)
            VALUES ($1, $2, $3, $4, $5, $6, 'unused', $7)
            RETURNING {COUPON_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Coupon>(&sql)
            .bind(&coupon.serial)
            .bind(&coupon.code)
            .bind(&coupon.kind)
            .bind(coupon.amount)
            .bind(&coupon.description)
            .bind(coupon.expire_on)
            .bind(coupon.create_time)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

        Ok(created)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1");

        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    async fn query(&self, query: &CouponQuery) -> Result<QueryPage> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM coupons");
        Self::push_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {COUPON_COLUMNS} FROM coupons"));
        Self::push_filters(&mut builder, query);
        // 列名与方向均来自白名单枚举，可安全拼接
        let direction = query.sort_order.as_sql();
        builder.push(format!(
            " ORDER BY {} {direction} NULLS LAST, id {direction}",
            query.order_by.column()
        ));
        builder.push(" LIMIT ").push_bind(query.limit);
        builder.push(" OFFSET ").push_bind(query.offset);

        let items = builder
            .build_query_as::<Coupon>()
            .fetch_all(&self.pool)
            .await?;

        Ok(QueryPage { total, items })
    }

    async fn mark_used(&self, info: &UseInfo) -> Result<Option<Coupon>> {
        // 状态判断放在 WHERE 中：并发更新同一行时，后到的事务在前者提交后
        // 重新评估条件，status 已不满足，返回 0 行
        let sql = format!(
            r#"
            UPDATE coupons
            SET status = 'used', use_time = $3, username = $4, namespace = $5
            WHERE serial = $1
              AND code = $2
              AND status = 'unused'
              AND (expire_on IS NULL OR expire_on > $3)
            RETURNING {COUPON_COLUMNS}
            "#
        );

        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(&info.serial)
            .bind(&info.code)
            .bind(info.use_time)
            .bind(&info.username)
            .bind(&info.namespace)
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

//! 请求 DTO 定义
//!
//! 创建与兑换的请求体直接反序列化为 `CouponDraft` / `RedemptionMetadata`，
//! 这里只保留列表查询参数的解析。

use crate::models::{CouponQuery, CouponStatus, OrderBy, SortOrder};

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: i64 = 30;
/// 每页条数上限
pub const MAX_PAGE_SIZE: i64 = 100;

/// 列表查询参数
///
/// 全部按字符串接收，无法解析的数值回退到默认值，不返回错误
#[derive(Debug, Clone, Default)]
pub struct ListCouponsQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub orderby: Option<String>,
    pub sortorder: Option<String>,
    pub offset: Option<String>,
    pub size: Option<String>,
    /// 从 1 开始的页码，仅在未提供 offset 时生效
    pub page: Option<String>,
}

fn parse_number(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListCouponsQuery {
    /// 从查询串键值对构造，同一个键出现多次时只取第一个值，未知键忽略
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "kind" => &mut query.kind,
                "status" => &mut query.status,
                "orderby" => &mut query.orderby,
                "sortorder" => &mut query.sortorder,
                "offset" => &mut query.offset,
                "size" => &mut query.size,
                "page" => &mut query.page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// 转换为仓储查询条件（白名单校验与分页钳制）
    pub fn to_query(&self) -> CouponQuery {
        let limit = parse_number(&self.size)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let offset = match parse_number(&self.offset) {
            Some(offset) => offset,
            None => parse_number(&self.page)
                .map(|page| (page.max(1) - 1).saturating_mul(limit))
                .unwrap_or(0),
        }
        .max(0);

        CouponQuery {
            kind: non_empty(&self.kind).map(str::to_string),
            status: non_empty(&self.status).and_then(CouponStatus::parse),
            order_by: non_empty(&self.orderby)
                .map(OrderBy::parse_or_default)
                .unwrap_or_default(),
            sort_order: non_empty(&self.sortorder)
                .map(SortOrder::parse_or_default)
                .unwrap_or_default(),
            offset,
            limit,
        }
    }
}

//! 优惠券 API 处理器
//!
//! 每个接口先检查存储是否就绪，再解析请求体，最后调用业务服务

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use tracing::info;

use crate::{
    dto::{ApiResponse, ListCouponsQuery},
    error::{ApiError, CouponError, Operation},
    models::{Coupon, QueryPage},
    service::{CouponDraft, RedemptionMetadata},
    state::AppState,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn parse_id(raw: &str, op: Operation) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiError::on(op)(CouponError::Validation(format!("无效的优惠券ID: {}", raw)))
    })
}

/// 创建优惠券
///
/// POST /api/v1/coupons
pub async fn create_coupon(
    State(state): State<AppState>,
    body: Result<Json<CouponDraft>, JsonRejection>,
) -> ApiResult<Coupon> {
    let services = state.services()?;
    let Json(draft) = body.map_err(ApiError::on_body(Operation::CreateCoupon))?;

    info!(kind = %draft.kind, amount = draft.amount, "Creating coupon");

    let coupon = services
        .registry
        .create(draft)
        .await
        .map_err(ApiError::on(Operation::CreateCoupon))?;

    info!(coupon_id = coupon.id, serial = %coupon.serial, "Coupon created");

    Ok(Json(ApiResponse::success(coupon)))
}

/// 删除优惠券
///
/// DELETE /api/v1/coupons/{id}
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let services = state.services()?;
    let id = parse_id(&id, Operation::DeleteCoupon)?;

    info!(coupon_id = id, "Deleting coupon");

    services
        .registry
        .delete(id)
        .await
        .map_err(ApiError::on(Operation::DeleteCoupon))?;

    info!(coupon_id = id, "Coupon deleted");

    Ok(Json(ApiResponse::success_empty()))
}

/// 获取优惠券详情
///
/// GET /api/v1/coupons/{id}
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Coupon> {
    let services = state.services()?;
    let id = parse_id(&id, Operation::RetrieveCoupon)?;

    let coupon = services
        .registry
        .retrieve(id)
        .await
        .map_err(ApiError::on(Operation::RetrieveCoupon))?;

    Ok(Json(ApiResponse::success(coupon)))
}

/// 查询优惠券列表
///
/// GET /api/v1/coupons?kind=&status=&orderby=&sortorder=&offset=&size=&page=
///
/// 参数按键值对接收，重复的键取第一个值
pub async fn list_coupons(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<QueryPage> {
    let services = state.services()?;
    let Query(pairs) = params?;
    let query = ListCouponsQuery::from_pairs(pairs).to_query();

    let page = services
        .registry
        .list(query)
        .await
        .map_err(ApiError::on(Operation::QueryCoupons))?;

    info!(total = page.total, returned = page.items.len(), "Coupons listed");

    Ok(Json(ApiResponse::success(page)))
}

/// 兑换优惠券
///
/// PUT /api/v1/coupons/{serial}/{code}
pub async fn use_coupon(
    State(state): State<AppState>,
    Path((serial, code)): Path<(String, String)>,
    body: Result<Json<RedemptionMetadata>, JsonRejection>,
) -> ApiResult<Coupon> {
    let services = state.services()?;
    let Json(metadata) = body.map_err(ApiError::on_body(Operation::UseCoupon))?;

    info!(serial = %serial, username = %metadata.username, "Redeeming coupon");

    let coupon = services
        .engine
        .redeem(&serial, &code, metadata)
        .await
        .map_err(ApiError::on(Operation::UseCoupon))?;

    info!(coupon_id = coupon.id, serial = %serial, "Coupon redeemed");

    Ok(Json(ApiResponse::success(coupon)))
}

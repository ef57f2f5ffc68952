//! 路由配置模块

use axum::{
    Router, middleware,
    routing::{get, put},
};

use coupon_shared::observability::middleware as obs_middleware;

use crate::{handlers, state::AppState};

/// 优惠券接口路由（挂载在 /api/v1 下）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/coupons",
            get(handlers::coupon::list_coupons).post(handlers::coupon::create_coupon),
        )
        .route(
            "/coupons/{id}",
            get(handlers::coupon::get_coupon).delete(handlers::coupon::delete_coupon),
        )
        .route("/coupons/{serial}/{code}", put(handlers::coupon::use_coupon))
}

/// 构建完整应用路由，包含探针与可观测性中间件
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

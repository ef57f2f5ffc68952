//! 健康检查处理器

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

const SERVICE_NAME: &str = "coupon-service";

/// 存活探针：服务进程正常即返回 ok
///
/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：存储已装入且能响应查询时返回 200，否则 503
///
/// GET /ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = match state.services() {
        Ok(services) => {
            if services.repo.health_check().await.is_ok() {
                "ok"
            } else {
                "fail"
            }
        }
        Err(_) => "not_initialized",
    };
    let ready = store == "ok";

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "checks": {
                "database": store
            }
        })),
    )
}

//! 可观测性与基础设施模块集成测试

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use coupon_shared::observability::metrics::{
        record_coupon_created, record_http_request, record_id_collision, record_redemption,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/v1/coupons", 200, 0.05);
        record_http_request("POST", "/api/v1/coupons", 400, 0.01);
        record_http_request("PUT", "/api/v1/coupons/{serial}/{code}", 200, 0.08);
        record_http_request("DELETE", "/api/v1/coupons/{id}", 500, 0.25);
    }

    #[test]
    fn test_record_coupon_metrics_without_recorder() {
        // 未安装 recorder 时记录操作为空操作
        record_coupon_created("discount10");
        record_id_collision();
        record_redemption("success", 0.01);
        record_redemption("rejected", 0.02);
        record_redemption("error", 0.5);
    }
}

// ============================================================================
// 日志过滤测试
// ============================================================================

mod tracing_tests {
    use coupon_shared::observability::tracing::build_env_filter;

    #[test]
    fn test_build_env_filter_never_panics() {
        let _ = build_env_filter("info,sqlx=warn");
        let _ = build_env_filter("[[not a directive");
    }
}

// ============================================================================
// 重试测试
// ============================================================================

mod retry_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use coupon_shared::retry::{RetryPolicy, retry_with_policy};
    use tokio_test::{assert_err, assert_ok};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_stops_on_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<&str, String> = retry_with_policy(&policy(5), "connect", |_| true, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("connected")
            }
        })
        .await;

        assert_ok!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_only_retryable_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_with_policy(
            &policy(5),
            "connect",
            |e: &String| e.starts_with("transient"),
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err("transient: refused".to_string())
                    } else {
                        Err("fatal: bad password".to_string())
                    }
                }
            },
        )
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use coupon_shared::observability::middleware::{
        REQUEST_ID_HEADER, RequestId, http_tracing, request_id,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_visible_to_handler() {
        let app = Router::new()
            .route(
                "/echo",
                get(|axum::Extension(id): axum::Extension<RequestId>| async move {
                    id.as_str().to_string()
                }),
            )
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"trace-42");
    }
}

//! 优惠券服务
//!
//! 提供优惠券创建、查询、删除与兑换的 REST API。

use std::sync::Arc;
use std::time::Duration;

use coupon_service::{
    AppState, CouponServices, MIGRATOR, MemoryCouponRepository, PgCouponRepository,
    RandomCodeGenerator, routes,
};
use coupon_shared::{
    config::{AppConfig, StoreBackend},
    database::Database,
    error::InfraError,
    observability,
    retry::{RetryPolicy, retry_with_policy},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "coupon-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    let _guard = observability::init(SERVICE_NAME, &config.observability).await?;

    // 日志初始化之后才能输出配置加载失败
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    let state = AppState::unavailable();
    let attempts = config.coupon.max_create_attempts;

    match config.coupon.store {
        StoreBackend::Memory => {
            if config.is_production() {
                warn!("In-memory coupon store selected in production");
            }
            warn!("Using in-memory coupon store, data will be lost on restart");
            state.install(CouponServices::new(
                Arc::new(MemoryCouponRepository::new()),
                Arc::new(RandomCodeGenerator),
                attempts,
            ));
        }
        StoreBackend::Postgres => match connect_store(&config).await {
            Ok(db) => {
                install_postgres(&state, db, attempts);
            }
            Err(e) => {
                // 首次连接失败不阻止启动，接口返回 DB_NOT_INITIALIZED 直到后台重连成功
                warn!(error = %e, "Database unavailable at startup, reconnecting in background");
                spawn_reconnect(state.clone(), config.clone());
            }
        },
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::app(state).layer(cors);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 连接数据库并执行迁移
async fn connect_store(config: &AppConfig) -> Result<Database, InfraError> {
    let db = Database::connect(&config.database).await?;
    db.run_migrations(&MIGRATOR).await?;
    Ok(db)
}

fn install_postgres(state: &AppState, db: Database, attempts: u32) {
    let repo = Arc::new(PgCouponRepository::new(db.pool().clone()));
    state.install(CouponServices::new(repo, Arc::new(RandomCodeGenerator), attempts));
    info!("Coupon store initialized");
}

/// 后台按指数退避重连数据库，成功后装入服务
fn spawn_reconnect(state: AppState, config: AppConfig) {
    let policy = RetryPolicy::forever(Duration::from_secs(config.coupon.db_reconnect_secs));

    tokio::spawn(async move {
        let result = retry_with_policy(
            &policy,
            "connect_coupon_store",
            InfraError::is_retryable,
            || connect_store(&config),
        )
        .await;

        match result {
            Ok(db) => install_postgres(&state, db, config.coupon.max_create_attempts),
            Err(e) => error!(error = %e, "Giving up on database connection"),
        }
    });
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

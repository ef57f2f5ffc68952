//! 应用状态定义
//!
//! 存储可能在启动时不可用，服务实例放在 `ArcSwapOption` 中，
//! 后台重连成功后再原子地装入，handler 无需加锁即可读取。

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::ApiError;
use crate::repository::CouponRepository;
use crate::service::{CodeGenerator, CouponRegistry, RedemptionEngine};

/// 绑定到同一存储的业务服务
pub struct CouponServices {
    pub registry: CouponRegistry,
    pub engine: RedemptionEngine,
    pub repo: Arc<dyn CouponRepository>,
}

impl CouponServices {
    pub fn new(
        repo: Arc<dyn CouponRepository>,
        generator: Arc<dyn CodeGenerator>,
        max_create_attempts: u32,
    ) -> Self {
        Self {
            registry: CouponRegistry::new(repo.clone(), generator, max_create_attempts),
            engine: RedemptionEngine::new(repo.clone()),
            repo,
        }
    }
}

/// Axum 应用共享状态
#[derive(Clone, Default)]
pub struct AppState {
    services: Arc<ArcSwapOption<CouponServices>>,
}

impl AppState {
    /// 存储已就绪的状态
    pub fn with_repository(
        repo: Arc<dyn CouponRepository>,
        generator: Arc<dyn CodeGenerator>,
        max_create_attempts: u32,
    ) -> Self {
        let state = Self::unavailable();
        state.install(CouponServices::new(repo, generator, max_create_attempts));
        state
    }

    /// 存储尚未就绪的状态，所有优惠券接口返回 DB_NOT_INITIALIZED
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// 装入业务服务，之后的请求立即可见
    pub fn install(&self, services: CouponServices) {
        self.services.store(Some(Arc::new(services)));
    }

    pub fn is_ready(&self) -> bool {
        self.services.load().is_some()
    }

    /// 获取业务服务，存储未就绪时返回 `ApiError::StoreUnavailable`
    pub fn services(&self) -> Result<Arc<CouponServices>, ApiError> {
        self.services.load_full().ok_or(ApiError::StoreUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryCouponRepository;
    use crate::service::RandomCodeGenerator;

    #[test]
    fn test_install_makes_services_visible() {
        let state = AppState::unavailable();
        assert!(!state.is_ready());
        assert!(matches!(state.services(), Err(ApiError::StoreUnavailable)));

        let cloned = state.clone();
        state.install(CouponServices::new(
            Arc::new(MemoryCouponRepository::new()),
            Arc::new(RandomCodeGenerator),
            3,
        ));
        assert!(cloned.is_ready());
        assert!(cloned.services().is_ok());
    }
}

//! 数据库仓储层
//!
//! 提供优惠券的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 兑换的“检查并更新”必须是单条原子操作，由仓储实现保证
//! - 定义 trait 接口以支持 mock 测试和内存实现

mod coupon_repo;
mod memory_repo;
mod traits;

pub use coupon_repo::PgCouponRepository;
pub use memory_repo::MemoryCouponRepository;
pub use traits::*;

//! 优惠券服务
//!
//! 提供优惠券的创建、删除、查询与兑换 REST API。
//!
//! ## 模块结构
//!
//! - `models`: 优惠券实体与枚举
//! - `repository`: 存储抽象，PostgreSQL 与内存两种实现
//! - `service`: 登记服务（Registry）与兑换引擎（Engine）
//! - `dto`: 请求参数解析与统一响应信封
//! - `handlers` / `routes`: HTTP 接口
//! - `state`: 可延迟装入的存储与服务

pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ApiError, CouponError, Result, StorageError};
pub use models::{Coupon, CouponQuery, CouponStatus, OrderBy, QueryPage, SortOrder};
pub use repository::{CouponRepository, MemoryCouponRepository, PgCouponRepository};
pub use service::{
    CodeGenerator, CouponDraft, CouponRegistry, RandomCodeGenerator, RedemptionEngine,
    RedemptionMetadata,
};
pub use state::{AppState, CouponServices};

/// 数据库迁移脚本（编译期嵌入）
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

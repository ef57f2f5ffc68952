//! 业务逻辑层
//!
//! - `CouponRegistry`：优惠券的创建、删除、查询
//! - `RedemptionEngine`：优惠券兑换（unused -> used 的原子流转）

mod code_generator;
mod redemption;
mod registry;

pub use code_generator::{CODE_ALPHABET, CODE_LENGTH, CodeGenerator, RandomCodeGenerator};
pub use redemption::{RedemptionEngine, RedemptionMetadata};
pub use registry::{CouponDraft, CouponRegistry};

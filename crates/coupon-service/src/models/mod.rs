//! 领域模型定义

mod coupon;
mod enums;

pub use coupon::{Coupon, CouponQuery, NewCoupon, QueryPage, UseInfo};
pub use enums::{CouponStatus, OrderBy, SortOrder};

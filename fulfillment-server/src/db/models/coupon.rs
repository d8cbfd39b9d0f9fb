//! Coupon model

use serde::{Deserialize, Serialize};
use shared::cart::DiscountType;

/// A discount coupon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub coupon_id: String,
    /// Redemption code, unique across coupons
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub discount_type: DiscountType,
    /// Percentage (0-100) or fixed amount, per discount_type
    pub value: f64,
    pub is_active: bool,
    /// Validity window: [start_date, expiration_date) in Unix milliseconds
    pub start_date: i64,
    pub expiration_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_purchase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses_per_user: Option<u32>,
    /// Non-stackable coupons reject any other coupon on the cart
    #[serde(default = "default_stackable")]
    pub is_stackable: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_stackable() -> bool {
    true
}

/// Create DTO
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CouponCreate {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub name: Option<String>,
    pub discount_type: DiscountType,
    #[validate(range(min = 0.0))]
    pub value: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub start_date: i64,
    pub expiration_date: i64,
    pub minimum_purchase: Option<f64>,
    pub max_uses_per_user: Option<u32>,
    #[serde(default = "default_stackable")]
    pub is_stackable: bool,
}

fn default_active() -> bool {
    true
}

//! Cart domain types
//!
//! A cart belongs to exactly one owner (registered account or guest device),
//! owns its line items, applied coupons and quoted shipping options, and
//! carries derived totals that are recomputed on every mutation - never
//! mutated independently.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cart ownership - exactly one of account or device, by construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartOwner {
    /// Registered account
    Account { account_id: String },
    /// Guest session, identified by a long-lived opaque device token
    Device { device_id: String },
}

impl CartOwner {
    /// Uniqueness key for the one-active-cart-per-owner rule
    pub fn key(&self) -> String {
        match self {
            CartOwner::Account { account_id } => format!("account:{}", account_id),
            CartOwner::Device { device_id } => format!("device:{}", device_id),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, CartOwner::Device { .. })
    }
}

/// Cart lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    #[default]
    Active,
    /// Converted into an order - immutable from this point on
    Converted,
    /// Account cart untouched beyond the inactivity window
    Abandoned,
    /// Guest cart past its TTL
    Expired,
}

/// Coupon discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Percentage of the (post-prior-discount) merchandise subtotal
    Percentage,
    /// Fixed amount, never discounting below zero
    FixedAmount,
    /// Zeroes the shipping charge, not merchandise
    FreeShipping,
}

/// Cart line item with the price captured at add-time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub listing_id: String,
    /// Listing title (snapshot for display and audit)
    pub name: String,
    pub quantity: i32,
    /// Unit price captured when the item was added; later listing price
    /// changes never affect this cart
    pub price_snapshot: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<HashMap<String, String>>,
    #[serde(default)]
    pub is_gift: bool,
    /// Digital items need no shipping and bypass rate lookup
    #[serde(default)]
    pub is_digital: bool,
    /// Unit weight for shipping quotes; None quotes with the default weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price_snapshot * self.quantity as f64
    }
}

/// Coupon applied to a cart
///
/// Terms are frozen at apply-time (like item price snapshots); the
/// applied_discount is recomputed against the cart on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartCoupon {
    pub coupon_id: String,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (0-100) or fixed amount, per discount_type
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_purchase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses_per_user: Option<u32>,
    #[serde(default = "default_stackable")]
    pub is_stackable: bool,
    /// Discount this coupon currently contributes (derived)
    pub applied_discount: f64,
    /// Stacking position; later coupons compute against the
    /// post-prior-discount subtotal
    pub application_order: i32,
}

fn default_stackable() -> bool {
    true
}

/// A quoted shipping option attached to a cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartShippingOption {
    pub option_id: String,
    pub carrier: String,
    pub service: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_days: Option<i32>,
    #[serde(default)]
    pub is_selected: bool,
}

/// Cart snapshot - the aggregate state persisted per cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartSnapshot {
    pub cart_id: String,
    pub owner: CartOwner,
    pub status: CartStatus,
    pub currency: String,
    pub items: Vec<CartItem>,
    pub coupons: Vec<CartCoupon>,
    pub shipping_options: Vec<CartShippingOption>,
    /// Sum of item line totals (derived)
    pub subtotal: f64,
    /// Sum of coupon applied_discounts (derived)
    pub total_discounts: f64,
    /// Selected shipping option amount (derived)
    pub total_shipping: f64,
    /// Tax on the discounted merchandise subtotal (derived)
    pub total_tax: f64,
    /// subtotal - discounts + shipping + tax (derived)
    pub total_price: f64,
    /// Guest carts only - reservation release deadline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Last cart event sequence
    #[serde(default)]
    pub last_sequence: u64,
}

impl CartSnapshot {
    pub fn new(cart_id: String, owner: CartOwner, currency: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            cart_id,
            owner,
            status: CartStatus::Active,
            currency,
            items: Vec::new(),
            coupons: Vec::new(),
            shipping_options: Vec::new(),
            subtotal: 0.0,
            total_discounts: 0.0,
            total_shipping: 0.0,
            total_tax: 0.0,
            total_price: 0.0,
            expires_at: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CartStatus::Active
    }

    pub fn item(&self, listing_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.listing_id == listing_id)
    }

    pub fn selected_shipping(&self) -> Option<&CartShippingOption> {
        self.shipping_options.iter().find(|o| o.is_selected)
    }

    /// True when every item is digital (or the cart is empty)
    pub fn all_digital(&self) -> bool {
        self.items.iter().all(|i| i.is_digital)
    }

    /// Next stacking position for a newly applied coupon
    pub fn next_application_order(&self) -> i32 {
        self.coupons
            .iter()
            .map(|c| c.application_order)
            .max()
            .map(|o| o + 1)
            .unwrap_or(0)
    }
}

/// Cart event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartEventType {
    CartCreated,
    ItemAdded,
    QuantityUpdated,
    ItemRemoved,
    CouponApplied,
    CouponRemoved,
    ShippingSelected,
    CartConverted,
    CartExpired,
    CartAbandoned,
}

/// Append-only cart audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEvent {
    pub event_id: String,
    pub cart_id: String,
    pub sequence: u64,
    pub event_type: CartEventType,
    /// Structured payload (listing id, quantities, coupon code, ...)
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub created_at: i64,
}

impl CartEvent {
    pub fn new(
        cart_id: String,
        sequence: u64,
        event_type: CartEventType,
        payload: serde_json::Value,
        actor_id: Option<String>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            cart_id,
            sequence,
            event_type,
            payload,
            actor_id,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(listing_id: &str, digital: bool) -> CartItem {
        CartItem {
            listing_id: listing_id.to_string(),
            name: listing_id.to_string(),
            quantity: 1,
            price_snapshot: 10.0,
            selected_options: None,
            is_gift: false,
            is_digital: digital,
            weight: None,
        }
    }

    #[test]
    fn owner_keys_are_disjoint() {
        let a = CartOwner::Account {
            account_id: "x".into(),
        };
        let d = CartOwner::Device {
            device_id: "x".into(),
        };
        assert_ne!(a.key(), d.key());
    }

    #[test]
    fn all_digital_requires_every_item() {
        let mut cart = CartSnapshot::new(
            "c1".into(),
            CartOwner::Device {
                device_id: "d".into(),
            },
            "USD".into(),
        );
        assert!(cart.all_digital());
        cart.items.push(item("phys", false));
        assert!(!cart.all_digital());
        cart.items[0].is_digital = true;
        cart.items.push(item("dig", true));
        assert!(cart.all_digital());
    }

    #[test]
    fn application_order_increments() {
        let mut cart = CartSnapshot::new(
            "c1".into(),
            CartOwner::Account {
                account_id: "a".into(),
            },
            "USD".into(),
        );
        assert_eq!(cart.next_application_order(), 0);
        cart.coupons.push(CartCoupon {
            coupon_id: "co1".into(),
            code: "TEN".into(),
            discount_type: DiscountType::Percentage,
            value: 10.0,
            minimum_purchase: None,
            max_uses_per_user: None,
            is_stackable: true,
            applied_discount: 0.0,
            application_order: 0,
        });
        assert_eq!(cart.next_application_order(), 1);
    }
}

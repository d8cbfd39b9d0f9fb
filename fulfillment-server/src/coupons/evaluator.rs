//! Coupon evaluator
//!
//! `evaluate` applies the eligibility rules in order, first failure
//! short-circuits; `compute_discount` is the shared discount math, also
//! used by the cart total recompute against frozen coupon terms.
//!
//! Uses rust_decimal internally, rounds to 2 decimal places half-up.

use crate::db::models::Coupon;
use rust_decimal::prelude::*;
use shared::cart::DiscountType;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Everything the rules need, computed by the caller
#[derive(Debug, Clone, Default)]
pub struct CouponContext {
    /// Full merchandise subtotal (minimum-purchase rule)
    pub cart_subtotal: f64,
    /// Merchandise subtotal after prior discounts in stacking order
    /// (discount basis)
    pub basis_subtotal: f64,
    /// Current shipping charge (free-shipping coupons discount this)
    pub total_shipping: f64,
    /// Evaluation time (Unix milliseconds)
    pub now: i64,
    /// Prior checkouts of this coupon by this account
    pub prior_uses: u32,
    /// Whether this coupon is already on the cart
    pub already_applied: bool,
}

/// Evaluation result
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub applicable: bool,
    pub discount_amount: f64,
    pub reason: Option<String>,
}

impl Evaluation {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            applicable: false,
            discount_amount: 0.0,
            reason: Some(reason.into()),
        }
    }

    fn applicable(discount_amount: f64) -> Self {
        Self {
            applicable: true,
            discount_amount,
            reason: None,
        }
    }
}

/// Discount contributed by a coupon against the given basis
///
/// - percentage: basis x value / 100
/// - fixed_amount: min(value, basis) - never discounts below zero
/// - free_shipping: the shipping charge - zeroes shipping, not merchandise
pub fn compute_discount(
    discount_type: DiscountType,
    value: f64,
    basis_subtotal: f64,
    total_shipping: f64,
) -> f64 {
    let basis = to_decimal(basis_subtotal).max(Decimal::ZERO);
    match discount_type {
        DiscountType::Percentage => to_f64(basis * to_decimal(value) / Decimal::ONE_HUNDRED),
        DiscountType::FixedAmount => to_f64(to_decimal(value).min(basis)),
        DiscountType::FreeShipping => to_f64(to_decimal(total_shipping).max(Decimal::ZERO)),
    }
}

/// Evaluate a coupon against a cart context
///
/// Rules, in order, first failure short-circuits:
/// 1. active and current time within [start_date, expiration_date)
/// 2. not already applied to this cart
/// 3. subtotal >= minimum_purchase, if set
/// 4. prior uses by this account < max_uses_per_user, if set
pub fn evaluate(coupon: &Coupon, ctx: &CouponContext) -> Evaluation {
    if !coupon.is_active {
        return Evaluation::rejected("coupon is not active");
    }
    if ctx.now < coupon.start_date || ctx.now >= coupon.expiration_date {
        return Evaluation::rejected("coupon is outside its validity window");
    }
    if ctx.already_applied {
        return Evaluation::rejected("coupon already applied to this cart");
    }
    if let Some(minimum) = coupon.minimum_purchase
        && ctx.cart_subtotal < minimum
    {
        return Evaluation::rejected(format!("minimum purchase of {minimum} not met"));
    }
    if let Some(max_uses) = coupon.max_uses_per_user
        && ctx.prior_uses >= max_uses
    {
        return Evaluation::rejected("usage limit reached for this account");
    }

    Evaluation::applicable(compute_discount(
        coupon.discount_type,
        coupon.value,
        ctx.basis_subtotal,
        ctx.total_shipping,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(discount_type: DiscountType, value: f64) -> Coupon {
        Coupon {
            coupon_id: "c1".into(),
            code: "TEST".into(),
            name: None,
            discount_type,
            value,
            is_active: true,
            start_date: 0,
            expiration_date: i64::MAX,
            minimum_purchase: None,
            max_uses_per_user: None,
            is_stackable: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn ctx(basis: f64) -> CouponContext {
        CouponContext {
            cart_subtotal: basis,
            basis_subtotal: basis,
            total_shipping: 0.0,
            now: 1_000,
            prior_uses: 0,
            already_applied: false,
        }
    }

    #[test]
    fn percentage_discount() {
        let result = evaluate(&coupon(DiscountType::Percentage, 10.0), &ctx(100.0));
        assert!(result.applicable);
        assert_eq!(result.discount_amount, 10.0);
    }

    #[test]
    fn fixed_amount_never_discounts_below_zero() {
        let result = evaluate(&coupon(DiscountType::FixedAmount, 25.0), &ctx(15.0));
        assert!(result.applicable);
        assert_eq!(result.discount_amount, 15.0);
    }

    #[test]
    fn free_shipping_zeroes_shipping_not_merchandise() {
        let mut context = ctx(100.0);
        context.total_shipping = 7.5;
        let result = evaluate(&coupon(DiscountType::FreeShipping, 0.0), &context);
        assert!(result.applicable);
        assert_eq!(result.discount_amount, 7.5);
    }

    #[test]
    fn inactive_short_circuits() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.is_active = false;
        // Even with every other rule failing too, the first rule's reason wins
        let mut context = ctx(0.0);
        context.already_applied = true;
        let result = evaluate(&c, &context);
        assert!(!result.applicable);
        assert_eq!(result.reason.as_deref(), Some("coupon is not active"));
    }

    #[test]
    fn validity_window_is_half_open() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.start_date = 100;
        c.expiration_date = 200;

        let mut context = ctx(50.0);
        context.now = 99;
        assert!(!evaluate(&c, &context).applicable);
        context.now = 100;
        assert!(evaluate(&c, &context).applicable);
        context.now = 199;
        assert!(evaluate(&c, &context).applicable);
        context.now = 200;
        assert!(!evaluate(&c, &context).applicable);
    }

    #[test]
    fn already_applied_rejected() {
        let mut context = ctx(100.0);
        context.already_applied = true;
        assert!(!evaluate(&coupon(DiscountType::Percentage, 10.0), &context).applicable);
    }

    #[test]
    fn minimum_purchase_enforced() {
        let mut c = coupon(DiscountType::FixedAmount, 5.0);
        c.minimum_purchase = Some(50.0);
        assert!(!evaluate(&c, &ctx(49.99)).applicable);
        assert!(evaluate(&c, &ctx(50.0)).applicable);
    }

    #[test]
    fn usage_limit_enforced() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.max_uses_per_user = Some(2);
        let mut context = ctx(100.0);
        context.prior_uses = 1;
        assert!(evaluate(&c, &context).applicable);
        context.prior_uses = 2;
        assert!(!evaluate(&c, &context).applicable);
    }

    #[test]
    fn stacked_percentages_compound() {
        // $100 cart, two 10% coupons: the second evaluates against $90
        let first = compute_discount(DiscountType::Percentage, 10.0, 100.0, 0.0);
        assert_eq!(first, 10.0);
        let second = compute_discount(DiscountType::Percentage, 10.0, 100.0 - first, 0.0);
        assert_eq!(second, 9.0);
        assert_eq!(100.0 - first - second, 81.0);
    }
}

//! Cart money calculations using rust_decimal for precision
//!
//! All arithmetic is done in `Decimal` internally, then converted to `f64`
//! for storage/serialization. Totals are derived state: every mutation path
//! calls [`recalculate_totals`] and nothing else ever writes them.

use crate::coupons;
use rust_decimal::prelude::*;
use shared::cart::{CartSnapshot, DiscountType};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9999;

#[inline]
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate a requested line quantity
pub fn validate_quantity(quantity: i32) -> Result<(), String> {
    if quantity <= 0 {
        return Err(format!("quantity must be positive, got {}", quantity));
    }
    if quantity > MAX_QUANTITY {
        return Err(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        ));
    }
    Ok(())
}

/// Validate a unit price coming from the catalog
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err(format!("price must be a finite number, got {}", price));
    }
    if price < 0.0 {
        return Err(format!("price must be non-negative, got {}", price));
    }
    if price > MAX_PRICE {
        return Err(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        ));
    }
    Ok(())
}

/// Recompute every derived total on the cart
///
/// - subtotal = Σ price_snapshot × quantity
/// - coupons re-evaluate in application_order; each merchandise coupon's
///   basis is the subtotal after prior discounts; a coupon whose minimum
///   purchase is no longer met contributes 0 until the cart grows back
/// - total_shipping is the selected option's amount; a free-shipping coupon
///   offsets exactly that charge
/// - total = subtotal − discounts + shipping + tax
pub fn recalculate_totals(cart: &mut CartSnapshot, tax_rate_percent: f64) {
    let subtotal: Decimal = cart
        .items
        .iter()
        .map(|i| to_decimal(i.price_snapshot) * Decimal::from(i.quantity))
        .sum();

    let shipping = cart
        .selected_shipping()
        .map(|o| to_decimal(o.amount))
        .unwrap_or(Decimal::ZERO);

    cart.coupons.sort_by_key(|c| c.application_order);

    let mut basis = subtotal;
    let mut total_discounts = Decimal::ZERO;
    let mut shipping_charge = shipping;
    for coupon in cart.coupons.iter_mut() {
        // Minimum purchase is checked against the full merchandise subtotal
        if let Some(minimum) = coupon.minimum_purchase
            && to_f64(subtotal) < minimum
        {
            coupon.applied_discount = 0.0;
            continue;
        }
        let discount = to_decimal(coupons::compute_discount(
            coupon.discount_type,
            coupon.value,
            to_f64(basis),
            to_f64(shipping_charge),
        ));
        coupon.applied_discount = to_f64(discount);
        total_discounts += discount;
        match coupon.discount_type {
            DiscountType::Percentage | DiscountType::FixedAmount => basis -= discount,
            DiscountType::FreeShipping => shipping_charge = Decimal::ZERO,
        }
    }

    let tax = basis.max(Decimal::ZERO) * to_decimal(tax_rate_percent) / Decimal::ONE_HUNDRED;

    cart.subtotal = to_f64(subtotal);
    cart.total_discounts = to_f64(total_discounts);
    cart.total_shipping = to_f64(shipping);
    cart.total_tax = to_f64(tax);
    cart.total_price = to_f64(subtotal - total_discounts + shipping + tax);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::{CartCoupon, CartItem, CartOwner, CartShippingOption};

    fn cart() -> CartSnapshot {
        CartSnapshot::new(
            "cart-1".into(),
            CartOwner::Account {
                account_id: "acc-1".into(),
            },
            "USD".into(),
        )
    }

    fn item(price: f64, quantity: i32) -> CartItem {
        CartItem {
            listing_id: format!("listing-{price}-{quantity}"),
            name: "Item".into(),
            quantity,
            price_snapshot: price,
            selected_options: None,
            is_gift: false,
            is_digital: false,
            weight: None,
        }
    }

    fn coupon(discount_type: DiscountType, value: f64, order: i32) -> CartCoupon {
        CartCoupon {
            coupon_id: format!("coupon-{order}"),
            code: format!("CODE{order}"),
            discount_type,
            value,
            minimum_purchase: None,
            max_uses_per_user: None,
            is_stackable: true,
            applied_discount: 0.0,
            application_order: order,
        }
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut c = cart();
        c.items = vec![item(10.99, 3), item(5.0, 1)];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.subtotal, 37.97);
        assert_eq!(c.total_price, 37.97);
    }

    #[test]
    fn stacking_order_matters() {
        // 100 × 0.9 × 0.9 = 81, not 100 × 0.8 = 80
        let mut c = cart();
        c.items = vec![item(50.0, 2)];
        c.coupons = vec![
            coupon(DiscountType::Percentage, 10.0, 0),
            coupon(DiscountType::Percentage, 10.0, 1),
        ];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.coupons[0].applied_discount, 10.0);
        assert_eq!(c.coupons[1].applied_discount, 9.0);
        assert_eq!(c.total_price, 81.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut c = cart();
        c.items = vec![item(19.99, 3), item(0.01, 7)];
        c.coupons = vec![
            coupon(DiscountType::Percentage, 12.5, 0),
            coupon(DiscountType::FixedAmount, 4.0, 1),
        ];
        recalculate_totals(&mut c, 8.0);
        let first = c.clone();
        recalculate_totals(&mut c, 8.0);
        assert_eq!(c.subtotal, first.subtotal);
        assert_eq!(c.total_discounts, first.total_discounts);
        assert_eq!(c.total_tax, first.total_tax);
        assert_eq!(c.total_price, first.total_price);
    }

    #[test]
    fn fixed_coupon_end_to_end_numbers() {
        // $50 × 2 with a $10 fixed coupon: subtotal 100, discount 10, total 90
        let mut c = cart();
        c.items = vec![item(50.0, 2)];
        c.coupons = vec![coupon(DiscountType::FixedAmount, 10.0, 0)];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.subtotal, 100.0);
        assert_eq!(c.total_discounts, 10.0);
        assert_eq!(c.total_price, 90.0);
    }

    #[test]
    fn free_shipping_offsets_shipping_only() {
        let mut c = cart();
        c.items = vec![item(20.0, 1)];
        c.shipping_options = vec![CartShippingOption {
            option_id: "opt-1".into(),
            carrier: "POSTAL".into(),
            service: "ground".into(),
            amount: 6.0,
            transit_days: Some(4),
            is_selected: true,
        }];
        c.coupons = vec![coupon(DiscountType::FreeShipping, 0.0, 0)];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.total_shipping, 6.0);
        assert_eq!(c.total_discounts, 6.0);
        // subtotal − discounts + shipping = 20 − 6 + 6
        assert_eq!(c.total_price, 20.0);
    }

    #[test]
    fn minimum_purchase_lapses_when_cart_shrinks() {
        let mut c = cart();
        c.items = vec![item(30.0, 2)];
        let mut restricted = coupon(DiscountType::FixedAmount, 5.0, 0);
        restricted.minimum_purchase = Some(50.0);
        c.coupons = vec![restricted];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.total_discounts, 5.0);

        c.items[0].quantity = 1;
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.total_discounts, 0.0);
        assert_eq!(c.total_price, 30.0);
    }

    #[test]
    fn accumulation_precision() {
        // Sum 0.01 a thousand times without float drift
        let mut c = cart();
        c.items = vec![item(0.01, 1000)];
        recalculate_totals(&mut c, 0.0);
        assert_eq!(c.subtotal, 10.0);
    }
}

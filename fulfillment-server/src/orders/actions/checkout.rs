//! Checkout command handler
//!
//! The single Cart → Order handoff. Everything happens in the manager's
//! transaction: reservation mirror verification, coupon usage consumption,
//! cart conversion and the OrderCreated event commit together or not at
//! all. Consumption itself commits later, when payment is received.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::storage::{
    append_cart_event, clear_owner_index, coupon_usage_count, increment_coupon_usage,
    reservation_for, store_cart,
};
use shared::actor::ActorContext;
use shared::cart::{CartEvent, CartEventType, CartOwner, CartSnapshot, CartStatus};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderItemSnapshot};

/// Checkout action
///
/// `order_id` and `order_number` are pre-generated by the manager (order
/// numbers come from the crash-safe counter outside this transaction).
#[derive(Debug, Clone)]
pub struct CheckoutAction {
    pub cart_id: String,
    pub order_id: String,
    pub order_number: String,
}

fn authorize_cart(cart: &CartSnapshot, actor: &ActorContext) -> Result<(), OrderError> {
    if actor.is_store_owner() || actor.is_system() {
        return Ok(());
    }
    let authorized = match &cart.owner {
        CartOwner::Account { account_id } => actor.account_id.as_deref() == Some(account_id),
        CartOwner::Device { device_id } => actor.device_id.as_deref() == Some(device_id),
    };
    if authorized {
        Ok(())
    } else {
        Err(OrderError::CartNotFound(cart.cart_id.clone()))
    }
}

impl CommandHandler for CheckoutAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Load and validate the cart
        let mut cart = ctx.load_cart(&self.cart_id)?;
        authorize_cart(&cart, &metadata.actor)?;
        if cart.status != CartStatus::Active {
            return Err(OrderError::CartNotActive(self.cart_id.clone()));
        }
        if cart.items.is_empty() {
            return Err(OrderError::CartEmpty(self.cart_id.clone()));
        }

        // 2. Physical carts need a selected shipping option
        let shipping = cart.selected_shipping().cloned();
        if !cart.all_digital() && shipping.is_none() {
            return Err(OrderError::ShippingNotSelected);
        }

        // 3. Reservations must mirror the cart 1:1 before conversion
        for item in &cart.items {
            let held = reservation_for(ctx.txn(), &item.listing_id, &self.cart_id)?;
            if held != item.quantity as i64 {
                return Err(OrderError::InvariantViolation(format!(
                    "reservation for {} holds {} but cart wants {}",
                    item.listing_id, held, item.quantity
                )));
            }
        }

        // 4. Re-check coupon usage limits and consume them
        let owner_key = cart.owner.key();
        for coupon in &cart.coupons {
            if let Some(max_uses) = coupon.max_uses_per_user {
                let used = coupon_usage_count(ctx.txn(), &coupon.coupon_id, &owner_key)?;
                if used >= max_uses {
                    return Err(OrderError::CouponNoLongerApplicable {
                        code: coupon.code.clone(),
                        reason: "usage limit reached for this account".into(),
                    });
                }
            }
        }
        for coupon in &cart.coupons {
            increment_coupon_usage(ctx.txn(), &coupon.coupon_id, &owner_key)?;
        }

        // 5. Freeze items - prices and quantities never change after this
        let items: Vec<OrderItemSnapshot> = cart
            .items
            .iter()
            .map(|item| OrderItemSnapshot {
                item_id: uuid::Uuid::new_v4().to_string(),
                listing_id: item.listing_id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                price_snapshot: item.price_snapshot,
                is_digital: item.is_digital,
                refund_status: None,
                refund_amount: 0.0,
            })
            .collect();

        // 6. Convert the cart - one-way, it is immutable from here on
        cart.status = CartStatus::Converted;
        cart.updated_at = chrono::Utc::now().timestamp_millis();
        cart.last_sequence += 1;
        append_cart_event(
            ctx.txn(),
            &CartEvent::new(
                cart.cart_id.clone(),
                cart.last_sequence,
                CartEventType::CartConverted,
                serde_json::json!({ "order_id": self.order_id }),
                Some(metadata.actor.audit_id()),
            ),
        )?;
        clear_owner_index(ctx.txn(), &owner_key)?;
        store_cart(ctx.txn(), &cart)?;

        // 7. Emit the creation event
        let seq = ctx.next_sequence()?;
        let event = metadata.event(
            seq,
            self.order_id.clone(),
            OrderEventType::OrderCreated,
            EventPayload::OrderCreated {
                cart_id: self.cart_id.clone(),
                order_number: self.order_number.clone(),
                owner: cart.owner.clone(),
                currency: cart.currency.clone(),
                items,
                coupons: cart.coupons.clone(),
                shipping,
                subtotal: cart.subtotal,
                total_discounts: cart.total_discounts,
                total_shipping: cart.total_shipping,
                total_tax: cart.total_tax,
                total_price: cart.total_price,
            },
        );
        Ok(vec![event])
    }
}

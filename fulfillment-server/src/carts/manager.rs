//! CartManager - cart aggregate operations
//!
//! # Operation flow
//!
//! ```text
//! operation(cart_id, ...)
//!     ├─ 1. Catalog/coupon lookups (reference data, outside the txn)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Load cart, check status + ownership
//!     ├─ 4. Mirror the reservation delta on the ledger
//!     ├─ 5. Mutate the cart, recompute totals
//!     ├─ 6. Append a cart event
//!     ├─ 7. Store and commit
//!     └─ 8. Return the fresh snapshot
//! ```
//!
//! A failure at any step aborts the transaction: totals, reservations and
//! the audit trail move together or not at all.

use crate::coupons::{self, CouponContext};
use crate::db::repository::CouponRepository;
use crate::inventory::ledger::{release_in_txn, reserve_in_txn};
use crate::inventory::LedgerError;
use crate::services::CatalogService;
use crate::shipping::RateOption;
use crate::storage::{
    self, EngineStorage, StorageError, append_cart_event, clear_owner_index, require_cart,
    set_owner_index, store_cart,
};
use super::money;
use redb::WriteTransaction;
use shared::AppError;
use shared::actor::ActorContext;
use shared::cart::{
    CartCoupon, CartEvent, CartEventType, CartItem, CartOwner, CartShippingOption, CartSnapshot,
    CartStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Cart operation errors
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Cart not found: {0}")]
    NotFound(String),

    #[error("Cart is not active: {0}")]
    NotActive(String),

    #[error("Item not in cart: {0}")]
    ItemNotFound(String),

    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    #[error("Listing is not purchasable: {0}")]
    NotPurchasable(String),

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("Coupon not applicable: {0}")]
    CouponNotApplicable(String),

    #[error("Coupon cannot be combined with other coupons")]
    CouponNotStackable,

    #[error("Shipping option not found: {0}")]
    ShippingOptionNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type CartResult<T> = Result<T, CartError>;

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        use shared::ErrorCode;
        match err {
            CartError::Storage(e) => e.into(),
            CartError::Ledger(e) => e.into(),
            // Foreign carts answer exactly like missing carts
            CartError::NotFound(id) => AppError::not_found(format!("Cart {}", id)),
            CartError::NotActive(id) => {
                AppError::with_message(ErrorCode::CartNotActive, format!("Cart {} is not active", id))
            }
            CartError::ItemNotFound(id) => {
                AppError::with_message(ErrorCode::CartItemNotFound, format!("Item {} not in cart", id))
            }
            CartError::ListingNotFound(id) => AppError::not_found(format!("Listing {}", id)),
            CartError::NotPurchasable(id) => AppError::with_message(
                ErrorCode::ListingNotPurchasable,
                format!("Listing {} is not purchasable", id),
            ),
            CartError::CouponNotFound(code) => AppError::not_found(format!("Coupon {}", code)),
            CartError::CouponNotApplicable(reason) => {
                AppError::with_message(ErrorCode::CouponNotActive, reason)
            }
            CartError::CouponNotStackable => AppError::new(ErrorCode::CouponNotStackable),
            CartError::ShippingOptionNotFound(id) => {
                AppError::with_message(ErrorCode::ShippingOptionNotFound, format!("Option {}", id))
            }
            CartError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Input for addItem
#[derive(Debug, Clone)]
pub struct AddItemInput {
    pub listing_id: String,
    pub quantity: i32,
    pub selected_options: Option<HashMap<String, String>>,
    pub is_gift: bool,
}

/// Result of one expiry sweep pass
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SweepOutcome {
    pub expired: usize,
    pub abandoned: usize,
}

/// Cart aggregate manager
pub struct CartManager {
    storage: EngineStorage,
    catalog: Arc<CatalogService>,
    coupon_repo: CouponRepository,
    currency: String,
    tax_rate_percent: f64,
    guest_ttl_ms: i64,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("currency", &self.currency)
            .field("guest_ttl_ms", &self.guest_ttl_ms)
            .finish_non_exhaustive()
    }
}

impl CartManager {
    pub fn new(
        storage: EngineStorage,
        catalog: Arc<CatalogService>,
        coupon_repo: CouponRepository,
        currency: impl Into<String>,
        tax_rate_percent: f64,
        guest_ttl_ms: i64,
    ) -> Self {
        Self {
            storage,
            catalog,
            coupon_repo,
            currency: currency.into(),
            tax_rate_percent,
            guest_ttl_ms,
        }
    }

    // ========== Access checks ==========

    /// Ownership check: a cart that is not the caller's answers like a
    /// missing cart, never confirming it exists
    fn authorize(cart: &CartSnapshot, actor: &ActorContext) -> CartResult<()> {
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
            Err(CartError::NotFound(cart.cart_id.clone()))
        }
    }

    fn require_active(cart: &CartSnapshot) -> CartResult<()> {
        if cart.is_active() {
            Ok(())
        } else {
            Err(CartError::NotActive(cart.cart_id.clone()))
        }
    }

    fn load_authorized(
        txn: &WriteTransaction,
        cart_id: &str,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let cart = require_cart(txn, cart_id).map_err(|e| match e {
            StorageError::CartNotFound(id) => CartError::NotFound(id),
            other => CartError::Storage(other),
        })?;
        Self::authorize(&cart, actor)?;
        Ok(cart)
    }

    /// Recompute totals, bump the audit sequence, append the event and
    /// persist - the single exit path for every mutation
    fn finalize(
        &self,
        txn: &WriteTransaction,
        cart: &mut CartSnapshot,
        event_type: CartEventType,
        payload: serde_json::Value,
        actor: &ActorContext,
    ) -> CartResult<()> {
        money::recalculate_totals(cart, self.tax_rate_percent);
        cart.updated_at = chrono::Utc::now().timestamp_millis();
        cart.last_sequence += 1;
        let event = CartEvent::new(
            cart.cart_id.clone(),
            cart.last_sequence,
            event_type,
            payload,
            Some(actor.audit_id()),
        );
        append_cart_event(txn, &event)?;
        store_cart(txn, cart)?;
        Ok(())
    }

    fn commit(txn: WriteTransaction) -> CartResult<()> {
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    // ========== Operations ==========

    /// Get the owner's active cart, creating one if none exists
    ///
    /// At most one active cart exists per owner; the owner index enforces
    /// the uniqueness lookup before insert.
    pub fn get_or_create_active_cart(
        &self,
        owner: CartOwner,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        if let Some(cart_id) = self.storage.get_active_cart_id(&owner.key())?
            && let Some(cart) = self.storage.get_cart(&cart_id)?
            && cart.is_active()
        {
            Self::authorize(&cart, actor)?;
            return Ok(cart);
        }

        let mut cart = CartSnapshot::new(
            uuid::Uuid::new_v4().to_string(),
            owner.clone(),
            self.currency.clone(),
        );
        if owner.is_guest() {
            cart.expires_at = Some(cart.created_at + self.guest_ttl_ms);
        }
        Self::authorize(&cart, actor)?;

        let txn = self.storage.begin_write()?;
        self.finalize(
            &txn,
            &mut cart,
            CartEventType::CartCreated,
            serde_json::json!({ "owner": owner.key() }),
            actor,
        )?;
        set_owner_index(&txn, &owner.key(), &cart.cart_id)?;
        Self::commit(txn)?;
        tracing::info!(cart_id = %cart.cart_id, owner = %owner.key(), "Cart created");
        Ok(cart)
    }

    /// Read a cart (ownership-checked)
    pub fn get_cart(&self, cart_id: &str, actor: &ActorContext) -> CartResult<CartSnapshot> {
        let cart = self
            .storage
            .get_cart(cart_id)?
            .ok_or_else(|| CartError::NotFound(cart_id.to_string()))?;
        Self::authorize(&cart, actor)?;
        Ok(cart)
    }

    /// Read a cart's audit trail (ownership-checked)
    pub fn get_cart_events(
        &self,
        cart_id: &str,
        actor: &ActorContext,
    ) -> CartResult<Vec<CartEvent>> {
        self.get_cart(cart_id, actor)?;
        Ok(self.storage.get_cart_events(cart_id)?)
    }

    /// Add an item (or increase an existing line), reserving the delta
    pub async fn add_item(
        &self,
        cart_id: &str,
        input: AddItemInput,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        money::validate_quantity(input.quantity).map_err(CartError::Validation)?;
        let meta = self
            .catalog
            .get_meta(&input.listing_id)
            .await
            .ok_or_else(|| CartError::ListingNotFound(input.listing_id.clone()))?;
        if !meta.is_purchasable() {
            return Err(CartError::NotPurchasable(input.listing_id.clone()));
        }
        money::validate_price(meta.price).map_err(CartError::Validation)?;

        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        reserve_in_txn(&txn, &input.listing_id, input.quantity as i64, cart_id, actor)?;

        if let Some(existing) = cart
            .items
            .iter_mut()
            .find(|i| i.listing_id == input.listing_id)
        {
            // Merge into the existing line; the original price snapshot
            // stays authoritative for this cart
            existing.quantity += input.quantity;
            if input.is_gift {
                existing.is_gift = true;
            }
        } else {
            cart.items.push(CartItem {
                listing_id: input.listing_id.clone(),
                name: meta.title.clone(),
                quantity: input.quantity,
                price_snapshot: meta.price,
                selected_options: input.selected_options,
                is_gift: input.is_gift,
                is_digital: meta.is_digital,
                weight: meta.weight,
            });
        }

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::ItemAdded,
            serde_json::json!({
                "listing_id": input.listing_id,
                "quantity": input.quantity,
            }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Set a line's quantity, reserving or releasing only the delta
    ///
    /// Quantity 0 is defined as removal and dispatches to the same path as
    /// [`Self::remove_item`].
    pub async fn update_item_quantity(
        &self,
        cart_id: &str,
        listing_id: &str,
        quantity: i32,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        if quantity == 0 {
            return self.remove_item(cart_id, listing_id, actor).await;
        }
        money::validate_quantity(quantity).map_err(CartError::Validation)?;

        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        let item = cart
            .items
            .iter_mut()
            .find(|i| i.listing_id == listing_id)
            .ok_or_else(|| CartError::ItemNotFound(listing_id.to_string()))?;
        let previous = item.quantity;
        let delta = quantity as i64 - previous as i64;
        if delta > 0 {
            reserve_in_txn(&txn, listing_id, delta, cart_id, actor)?;
        } else if delta < 0 {
            release_in_txn(&txn, listing_id, -delta, cart_id, actor)?;
        }
        item.quantity = quantity;

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::QuantityUpdated,
            serde_json::json!({
                "listing_id": listing_id,
                "previous_quantity": previous,
                "quantity": quantity,
            }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Remove a line, releasing its full reservation
    pub async fn remove_item(
        &self,
        cart_id: &str,
        listing_id: &str,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        let index = cart
            .items
            .iter()
            .position(|i| i.listing_id == listing_id)
            .ok_or_else(|| CartError::ItemNotFound(listing_id.to_string()))?;
        let removed = cart.items.remove(index);
        release_in_txn(&txn, listing_id, removed.quantity as i64, cart_id, actor)?;

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::ItemRemoved,
            serde_json::json!({
                "listing_id": listing_id,
                "quantity": removed.quantity,
            }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Apply a coupon by code
    ///
    /// Terms are frozen onto the cart; stacking and eligibility are checked
    /// here, and the usage limit is consumed at checkout.
    pub async fn apply_coupon(
        &self,
        cart_id: &str,
        code: &str,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let coupon = self
            .coupon_repo
            .find_by_code(code)
            .await
            .map_err(|e| CartError::Validation(e.to_string()))?
            .ok_or_else(|| CartError::CouponNotFound(code.to_string()))?;

        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        // Stacking: a non-stackable coupon tolerates no company, in either
        // direction
        if !coupon.is_stackable && !cart.coupons.is_empty() {
            return Err(CartError::CouponNotStackable);
        }
        if cart.coupons.iter().any(|c| !c.is_stackable) {
            return Err(CartError::CouponNotStackable);
        }

        let merchandise_discounts: f64 = cart
            .coupons
            .iter()
            .filter(|c| c.discount_type != shared::cart::DiscountType::FreeShipping)
            .map(|c| c.applied_discount)
            .sum();
        let prior_uses =
            storage::coupon_usage_count(&txn, &coupon.coupon_id, &cart.owner.key())?;
        let evaluation = coupons::evaluate(
            &coupon,
            &CouponContext {
                cart_subtotal: cart.subtotal,
                basis_subtotal: cart.subtotal - merchandise_discounts,
                total_shipping: cart.total_shipping,
                now: chrono::Utc::now().timestamp_millis(),
                prior_uses,
                already_applied: cart.coupons.iter().any(|c| c.coupon_id == coupon.coupon_id),
            },
        );
        if !evaluation.applicable {
            return Err(CartError::CouponNotApplicable(
                evaluation.reason.unwrap_or_else(|| "not applicable".into()),
            ));
        }

        let order = cart.next_application_order();
        cart.coupons.push(CartCoupon {
            coupon_id: coupon.coupon_id.clone(),
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            value: coupon.value,
            minimum_purchase: coupon.minimum_purchase,
            max_uses_per_user: coupon.max_uses_per_user,
            is_stackable: coupon.is_stackable,
            applied_discount: evaluation.discount_amount,
            application_order: order,
        });

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::CouponApplied,
            serde_json::json!({
                "coupon_id": coupon.coupon_id,
                "code": coupon.code,
                "application_order": order,
            }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Remove an applied coupon
    pub async fn remove_coupon(
        &self,
        cart_id: &str,
        coupon_id: &str,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        let index = cart
            .coupons
            .iter()
            .position(|c| c.coupon_id == coupon_id)
            .ok_or_else(|| CartError::CouponNotFound(coupon_id.to_string()))?;
        let removed = cart.coupons.remove(index);

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::CouponRemoved,
            serde_json::json!({
                "coupon_id": removed.coupon_id,
                "code": removed.code,
            }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Replace the cart's quoted shipping options (selection resets)
    pub fn attach_rate_options(
        &self,
        cart_id: &str,
        rates: &[RateOption],
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        cart.shipping_options = rates
            .iter()
            .map(|r| CartShippingOption {
                option_id: uuid::Uuid::new_v4().to_string(),
                carrier: r.carrier.clone(),
                service: r.service.clone(),
                amount: r.amount,
                transit_days: r.transit_days,
                is_selected: false,
            })
            .collect();

        money::recalculate_totals(&mut cart, self.tax_rate_percent);
        cart.updated_at = chrono::Utc::now().timestamp_millis();
        store_cart(&txn, &cart)?;
        Self::commit(txn)?;
        Ok(cart)
    }

    /// Select exactly one of the quoted options
    pub fn select_shipping_option(
        &self,
        cart_id: &str,
        option_id: &str,
        actor: &ActorContext,
    ) -> CartResult<CartSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut cart = Self::load_authorized(&txn, cart_id, actor)?;
        Self::require_active(&cart)?;

        if !cart.shipping_options.iter().any(|o| o.option_id == option_id) {
            return Err(CartError::ShippingOptionNotFound(option_id.to_string()));
        }
        for option in cart.shipping_options.iter_mut() {
            option.is_selected = option.option_id == option_id;
        }

        self.finalize(
            &txn,
            &mut cart,
            CartEventType::ShippingSelected,
            serde_json::json!({ "option_id": option_id }),
            actor,
        )?;
        Self::commit(txn)?;
        Ok(cart)
    }

    // ========== Expiry sweep ==========

    /// Release reservations of carts past their lifetime
    ///
    /// Guest carts past `expires_at` become `expired`; account carts
    /// untouched beyond the same window become `abandoned`. This is the
    /// background compensation path for checkouts that never completed.
    pub fn sweep_expired(&self) -> CartResult<SweepOutcome> {
        let now = chrono::Utc::now().timestamp_millis();
        let actor = ActorContext::system();
        let mut outcome = SweepOutcome::default();

        for cart_id in self.storage.get_all_cart_ids()? {
            let Some(cart) = self.storage.get_cart(&cart_id)? else {
                continue;
            };
            if !cart.is_active() {
                continue;
            }
            let (next_status, event_type) = match &cart.owner {
                CartOwner::Device { .. } => match cart.expires_at {
                    Some(expires_at) if expires_at <= now => {
                        (CartStatus::Expired, CartEventType::CartExpired)
                    }
                    _ => continue,
                },
                CartOwner::Account { .. } => {
                    if cart.updated_at + self.guest_ttl_ms <= now {
                        (CartStatus::Abandoned, CartEventType::CartAbandoned)
                    } else {
                        continue;
                    }
                }
            };

            let txn = self.storage.begin_write()?;
            let mut cart = match require_cart(&txn, &cart_id) {
                Ok(c) if c.is_active() => c,
                _ => continue,
            };
            for item in &cart.items {
                release_in_txn(&txn, &item.listing_id, item.quantity as i64, &cart_id, &actor)?;
            }
            cart.status = next_status;
            clear_owner_index(&txn, &cart.owner.key())?;
            self.finalize(
                &txn,
                &mut cart,
                event_type,
                serde_json::json!({ "swept_at": now }),
                &actor,
            )?;
            Self::commit(txn)?;

            match next_status {
                CartStatus::Expired => outcome.expired += 1,
                CartStatus::Abandoned => outcome.abandoned += 1,
                _ => {}
            }
            tracing::info!(cart_id = %cart_id, status = ?next_status, "Cart swept");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{CouponCreate, ListingCreate};
    use crate::db::repository::ListingRepository;
    use crate::inventory::InventoryLedger;
    use shared::cart::DiscountType;

    struct Fixture {
        manager: CartManager,
        ledger: InventoryLedger,
        storage: EngineStorage,
        coupon_repo: CouponRepository,
        listing_id: String,
    }

    async fn fixture() -> Fixture {
        fixture_with_ttl(7 * 24 * 3600 * 1000).await
    }

    async fn fixture_with_ttl(guest_ttl_ms: i64) -> Fixture {
        let storage = EngineStorage::open_in_memory().unwrap();
        let db = DbService::new_in_memory().await.unwrap();
        let listing_repo = ListingRepository::new(db.db.clone());
        let listing = listing_repo
            .create(ListingCreate {
                title: "Ceramic Mug".into(),
                description: None,
                price: 12.0,
                currency: None,
                published: true,
                is_digital: false,
                weight: Some(0.4),
                dimensions: None,
                seller_id: None,
                image_url: None,
                initial_quantity: 0,
                restock_threshold: 0,
            })
            .await
            .unwrap();
        let ledger = InventoryLedger::new(storage.clone());
        ledger
            .adjust_quantity(&listing.listing_id, 10, &ActorContext::system())
            .unwrap();

        let catalog = Arc::new(CatalogService::new(db.db.clone()));
        let coupon_repo = CouponRepository::new(db.db.clone());
        let manager = CartManager::new(
            storage.clone(),
            catalog,
            coupon_repo.clone(),
            "USD",
            0.0,
            guest_ttl_ms,
        );
        Fixture {
            manager,
            ledger,
            storage,
            coupon_repo,
            listing_id: listing.listing_id,
        }
    }

    fn guest() -> (CartOwner, ActorContext) {
        (
            CartOwner::Device {
                device_id: "dev-1".into(),
            },
            ActorContext::guest("dev-1"),
        )
    }

    #[tokio::test]
    async fn one_active_cart_per_owner() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let first = f
            .manager
            .get_or_create_active_cart(owner.clone(), &actor)
            .unwrap();
        let second = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        assert_eq!(first.cart_id, second.cart_id);
        assert!(first.expires_at.is_some());
    }

    #[tokio::test]
    async fn add_item_reserves_and_recomputes() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();

        let cart = f
            .manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 2,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap();

        assert_eq!(cart.subtotal, 24.0);
        assert_eq!(cart.total_price, 24.0);
        let record = f.ledger.get(&f.listing_id).unwrap().unwrap();
        assert_eq!(record.quantity_reserved, 2);
        assert_eq!(
            f.storage.get_reservation(&f.listing_id, &cart.cart_id).unwrap(),
            2
        );
        // Audit trail: created + item_added
        let events = f.storage.get_cart_events(&cart.cart_id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, CartEventType::ItemAdded);
    }

    #[tokio::test]
    async fn quantity_update_is_delta_based() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        let cart = f
            .manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 4,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap();

        // Shrink to 1: only the difference is released
        let cart = f
            .manager
            .update_item_quantity(&cart.cart_id, &f.listing_id, 1, &actor)
            .await
            .unwrap();
        assert_eq!(cart.items[0].quantity, 1);
        let record = f.ledger.get(&f.listing_id).unwrap().unwrap();
        assert_eq!(record.quantity_reserved, 1);

        // The ledger log shows the delta, not a full re-reserve
        let entries = f.ledger.transactions(&f.listing_id).unwrap();
        let changes: Vec<i64> = entries.iter().map(|e| e.quantity_change).collect();
        assert!(changes.contains(&-4) && changes.contains(&3));
    }

    #[tokio::test]
    async fn quantity_zero_dispatches_to_removal() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        let cart = f
            .manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 2,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap();

        let cart = f
            .manager
            .update_item_quantity(&cart.cart_id, &f.listing_id, 0, &actor)
            .await
            .unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_price, 0.0);
        let record = f.ledger.get(&f.listing_id).unwrap().unwrap();
        assert_eq!(record.quantity_reserved, 0);

        let events = f.storage.get_cart_events(&cart.cart_id).unwrap();
        assert_eq!(
            events.last().unwrap().event_type,
            CartEventType::ItemRemoved
        );
    }

    #[tokio::test]
    async fn oversell_rejected_with_available() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        let err = f
            .manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 11,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Ledger(LedgerError::InsufficientStock { available: 10, .. })
        ));
        // Nothing persisted
        let cart = f.manager.get_cart(&cart.cart_id, &actor).unwrap();
        assert!(cart.items.is_empty());
    }

    #[tokio::test]
    async fn foreign_cart_reads_as_missing() {
        let f = fixture().await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();

        let stranger = ActorContext::guest("dev-other");
        let err = f.manager.get_cart(&cart.cart_id, &stranger).unwrap_err();
        assert!(matches!(err, CartError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_stackable_rejects_company() {
        let f = fixture().await;
        let now = chrono::Utc::now().timestamp_millis();
        f.coupon_repo
            .create(CouponCreate {
                code: "SOLO".into(),
                name: None,
                discount_type: DiscountType::Percentage,
                value: 20.0,
                is_active: true,
                start_date: now - 1000,
                expiration_date: now + 86_400_000,
                minimum_purchase: None,
                max_uses_per_user: None,
                is_stackable: false,
            })
            .await
            .unwrap();
        f.coupon_repo
            .create(CouponCreate {
                code: "TEN".into(),
                name: None,
                discount_type: DiscountType::Percentage,
                value: 10.0,
                is_active: true,
                start_date: now - 1000,
                expiration_date: now + 86_400_000,
                minimum_purchase: None,
                max_uses_per_user: None,
                is_stackable: true,
            })
            .await
            .unwrap();

        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        let cart = f
            .manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 1,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap();

        f.manager
            .apply_coupon(&cart.cart_id, "TEN", &actor)
            .await
            .unwrap();
        let err = f
            .manager
            .apply_coupon(&cart.cart_id, "SOLO", &actor)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::CouponNotStackable));
    }

    #[tokio::test]
    async fn sweep_releases_expired_guest_reservations() {
        // TTL 0: the guest cart expires immediately
        let f = fixture_with_ttl(0).await;
        let (owner, actor) = guest();
        let cart = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        f.manager
            .add_item(
                &cart.cart_id,
                AddItemInput {
                    listing_id: f.listing_id.clone(),
                    quantity: 3,
                    selected_options: None,
                    is_gift: false,
                },
                &actor,
            )
            .await
            .unwrap();

        let outcome = f.manager.sweep_expired().unwrap();
        assert_eq!(outcome.expired, 1);

        let record = f.ledger.get(&f.listing_id).unwrap().unwrap();
        assert_eq!(record.quantity_reserved, 0);
        let cart = f.manager.get_cart(&cart.cart_id, &actor).unwrap();
        assert_eq!(cart.status, CartStatus::Expired);
        // The owner can open a fresh cart afterwards
        let (owner, _) = guest();
        let fresh = f.manager.get_or_create_active_cart(owner, &actor).unwrap();
        assert_ne!(fresh.cart_id, cart.cart_id);
    }
}

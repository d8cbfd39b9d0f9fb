//! End-to-end engine flow: cart → reservation → coupon → rates → checkout
//! → payment → fulfillment → refund, against in-memory storage with the
//! static rate provider and the mock payment gateway.

use fulfillment_server::carts::AddItemInput;
use fulfillment_server::core::{Config, ServerState};
use fulfillment_server::db::models::{CouponCreate, ListingCreate};
use shared::actor::ActorContext;
use shared::cart::{CartOwner, CartStatus, DiscountType};
use shared::order::{
    FulfillmentStatus, OrderCommand, OrderCommandPayload, OrderStatus, PaymentOutcome,
    PaymentStatus, ShipmentItem,
};

fn test_config() -> Config {
    Config {
        work_dir: String::new(),
        http_port: 0,
        environment: "test".into(),
        timezone: chrono_tz::UTC,
        currency: "USD".into(),
        tax_rate_percent: 0.0,
        origin_postal_code: "10001".into(),
        rate_provider_url: None,
        rate_timeout_ms: 1000,
        rate_cache_ttl_hours: 24,
        payment_gateway_url: None,
        payment_timeout_ms: 1000,
        guest_cart_ttl_hours: 168,
        cart_sweep_interval_secs: 300,
        verify_interval_secs: 3600,
        shutdown_timeout_ms: 1000,
    }
}

async fn engine() -> ServerState {
    ServerState::initialize_in_memory(&test_config())
        .await
        .expect("engine init")
}

async fn seed_listing(
    state: &ServerState,
    title: &str,
    price: f64,
    digital: bool,
    stock: i64,
) -> String {
    let listing = state
        .listing_repo
        .create(ListingCreate {
            title: title.into(),
            description: None,
            price,
            currency: None,
            published: true,
            is_digital: digital,
            weight: if digital { None } else { Some(0.5) },
            dimensions: None,
            seller_id: None,
            image_url: None,
            initial_quantity: 0,
            restock_threshold: 0,
        })
        .await
        .expect("listing create");
    state
        .ledger
        .adjust_quantity(&listing.listing_id, stock, &ActorContext::system())
        .expect("seed stock");
    listing.listing_id
}

async fn seed_fixed_coupon(state: &ServerState, code: &str, amount: f64) {
    let now = chrono::Utc::now().timestamp_millis();
    state
        .coupon_repo
        .create(CouponCreate {
            code: code.into(),
            name: None,
            discount_type: DiscountType::FixedAmount,
            value: amount,
            is_active: true,
            start_date: now - 1_000,
            expiration_date: now + 86_400_000,
            minimum_purchase: None,
            max_uses_per_user: None,
            is_stackable: true,
        })
        .await
        .expect("coupon create");
}

#[tokio::test]
async fn full_digital_checkout_flow() {
    let state = engine().await;
    let actor = ActorContext::customer("acc-1");
    let owner = CartOwner::Account {
        account_id: "acc-1".into(),
    };

    // Listing X: $50, digital, 10 in stock
    let listing_x = seed_listing(&state, "Font Bundle", 50.0, true, 10).await;
    let listing_d = seed_listing(&state, "Icon Pack", 5.0, true, 100).await;
    seed_fixed_coupon(&state, "TENOFF", 10.0).await;

    // Cart: 2 × $50, then a $10 fixed coupon
    let cart = state
        .carts
        .get_or_create_active_cart(owner, &actor)
        .unwrap();
    let cart = state
        .carts
        .add_item(
            &cart.cart_id,
            AddItemInput {
                listing_id: listing_x.clone(),
                quantity: 2,
                selected_options: None,
                is_gift: false,
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(cart.subtotal, 100.0);

    let cart = state
        .carts
        .apply_coupon(&cart.cart_id, "TENOFF", &actor)
        .await
        .unwrap();
    assert_eq!(cart.subtotal, 100.0);
    assert_eq!(cart.total_discounts, 10.0);
    assert_eq!(cart.total_price, 90.0);

    // Reservation mirrors the cart
    let record = state.ledger.get(&listing_x).unwrap().unwrap();
    assert_eq!(record.quantity_available, 10);
    assert_eq!(record.quantity_reserved, 2);

    // Add the digital-only second item; the resolver synthesizes one free
    // "N/A" rate and never calls the provider
    let cart = state
        .carts
        .add_item(
            &cart.cart_id,
            AddItemInput {
                listing_id: listing_d.clone(),
                quantity: 1,
                selected_options: None,
                is_gift: false,
            },
            &actor,
        )
        .await
        .unwrap();
    let rates = state.rates.get_rates(&cart, "94103").await.unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].carrier, "N/A");
    assert_eq!(rates[0].amount, 0.0);
    assert_eq!(cart.total_price, 95.0);

    // Checkout: pending / unpaid, cart converted and immutable
    let response = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        ))
        .await;
    assert!(response.success, "checkout failed: {:?}", response.error);
    let order = response.snapshot.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.total_price, 95.0);

    let cart_after = state.carts.get_cart(&cart.cart_id, &actor).unwrap();
    assert_eq!(cart_after.status, CartStatus::Converted);
    let mutate = state
        .carts
        .update_item_quantity(&cart.cart_id, &listing_x, 1, &actor)
        .await;
    assert!(mutate.is_err(), "converted carts must be immutable");

    // Payment intent + gateway callback: paid, processing, consumption
    // committed - available drops by 2, reservation returns to baseline
    let intent = state
        .gateway
        .create_payment_intent(order.total_price, &order.currency, "acc-1")
        .await
        .unwrap();
    let attach = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::CreatePaymentIntent {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id.clone(),
                amount: order.total_price,
            },
        ))
        .await;
    assert!(attach.success, "intent failed: {:?}", attach.error);

    let paid = state
        .orders
        .execute_command(OrderCommand::new(
            ActorContext::system(),
            OrderCommandPayload::RecordPayment {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id,
                outcome: PaymentOutcome::Succeeded,
            },
        ))
        .await;
    assert!(paid.success, "payment failed: {:?}", paid.error);
    let order = paid.snapshot.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    // All-digital orders fulfill at payment
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);

    let record = state.ledger.get(&listing_x).unwrap().unwrap();
    assert_eq!(record.quantity_available, 8);
    assert_eq!(record.quantity_reserved, 0);
    assert!(state.ledger.reconcile(&listing_x).unwrap().consistent);

    // The event log replays into the cached snapshot
    let events = state
        .orders
        .get_order_events(&order.order_id, &actor)
        .unwrap();
    let replayed = fulfillment_server::orders::replay(&order.order_id, &events);
    assert_eq!(replayed.state_checksum, order.state_checksum);
}

#[tokio::test]
async fn physical_checkout_requires_selected_shipping() {
    let state = engine().await;
    let actor = ActorContext::guest("dev-7");
    let owner = CartOwner::Device {
        device_id: "dev-7".into(),
    };
    let listing = seed_listing(&state, "Ceramic Mug", 20.0, false, 5).await;

    let cart = state
        .carts
        .get_or_create_active_cart(owner, &actor)
        .unwrap();
    state
        .carts
        .add_item(
            &cart.cart_id,
            AddItemInput {
                listing_id: listing.clone(),
                quantity: 1,
                selected_options: None,
                is_gift: false,
            },
            &actor,
        )
        .await
        .unwrap();

    // Checkout without a selected option fails; the cart stays active and
    // keeps its reservation (full rollback)
    let response = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        ))
        .await;
    assert!(!response.success);
    let cart_after = state.carts.get_cart(&cart.cart_id, &actor).unwrap();
    assert_eq!(cart_after.status, CartStatus::Active);
    assert_eq!(state.storage.get_reservation(&listing, &cart.cart_id).unwrap(), 1);

    // Quote rates (static provider), select the cheapest, then checkout
    let quoted = state.rates.get_rates(&cart_after, "94103").await.unwrap();
    assert!(quoted.len() >= 2);
    let cart_after = state
        .carts
        .attach_rate_options(&cart.cart_id, &quoted, &actor)
        .unwrap();
    let option_id = cart_after.shipping_options[0].option_id.clone();
    let cart_after = state
        .carts
        .select_shipping_option(&cart.cart_id, &option_id, &actor)
        .unwrap();
    assert_eq!(cart_after.total_shipping, 6.95);
    assert_eq!(cart_after.total_price, 26.95);

    let response = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        ))
        .await;
    assert!(response.success, "checkout failed: {:?}", response.error);
    let order = response.snapshot.unwrap();
    assert_eq!(order.total_shipping, 6.95);
    assert!(order.shipping.is_some());
}

#[tokio::test]
async fn shipment_and_delivery_complete_the_order() {
    let state = engine().await;
    let actor = ActorContext::customer("acc-9");
    let owner = CartOwner::Account {
        account_id: "acc-9".into(),
    };
    let listing = seed_listing(&state, "Ceramic Mug", 20.0, false, 5).await;

    let cart = state
        .carts
        .get_or_create_active_cart(owner, &actor)
        .unwrap();
    let cart = state
        .carts
        .add_item(
            &cart.cart_id,
            AddItemInput {
                listing_id: listing.clone(),
                quantity: 2,
                selected_options: None,
                is_gift: false,
            },
            &actor,
        )
        .await
        .unwrap();
    let quoted = state.rates.get_rates(&cart, "94103").await.unwrap();
    let cart = state
        .carts
        .attach_rate_options(&cart.cart_id, &quoted, &actor)
        .unwrap();
    let option_id = cart.shipping_options[0].option_id.clone();
    state
        .carts
        .select_shipping_option(&cart.cart_id, &option_id, &actor)
        .unwrap();

    let order = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        ))
        .await
        .snapshot
        .unwrap();
    let intent = state
        .gateway
        .create_payment_intent(order.total_price, &order.currency, "acc-9")
        .await
        .unwrap();
    state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::CreatePaymentIntent {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id.clone(),
                amount: order.total_price,
            },
        ))
        .await;
    state
        .orders
        .execute_command(OrderCommand::new(
            ActorContext::system(),
            OrderCommandPayload::RecordPayment {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id,
                outcome: PaymentOutcome::Succeeded,
            },
        ))
        .await;

    // Ship both units, confirm delivery: shipped → delivered
    let store = ActorContext::store_owner("owner-1");
    let paid_order = state.orders.get_order(&order.order_id, &store).unwrap();
    let item_id = paid_order.items[0].item_id.clone();
    let shipped = state
        .orders
        .execute_command(OrderCommand::new(
            store.clone(),
            OrderCommandPayload::CreateShipment {
                order_id: order.order_id.clone(),
                items: vec![ShipmentItem {
                    item_id: item_id.clone(),
                    quantity: 2,
                }],
                carrier: "POSTAL".into(),
                service: Some("ground".into()),
                tracking_number: Some("TRK-123".into()),
            },
        ))
        .await;
    assert!(shipped.success, "shipment failed: {:?}", shipped.error);
    let snapshot = shipped.snapshot.unwrap();
    assert_eq!(snapshot.status, OrderStatus::Shipped);
    assert_eq!(snapshot.fulfillment_status, FulfillmentStatus::Fulfilled);

    let shipment_id = snapshot.shipments[0].shipment_id.clone();
    let delivered = state
        .orders
        .execute_command(OrderCommand::new(
            store,
            OrderCommandPayload::ConfirmDelivery {
                order_id: order.order_id.clone(),
                shipment_id,
            },
        ))
        .await;
    assert!(delivered.success);
    assert_eq!(delivered.snapshot.unwrap().status, OrderStatus::Delivered);
}

#[tokio::test]
async fn refund_bound_and_no_auto_restock() {
    let state = engine().await;
    let actor = ActorContext::customer("acc-2");
    let owner = CartOwner::Account {
        account_id: "acc-2".into(),
    };
    let listing = seed_listing(&state, "Poster", 30.0, true, 10).await;

    let cart = state
        .carts
        .get_or_create_active_cart(owner, &actor)
        .unwrap();
    state
        .carts
        .add_item(
            &cart.cart_id,
            AddItemInput {
                listing_id: listing.clone(),
                quantity: 3,
                selected_options: None,
                is_gift: false,
            },
            &actor,
        )
        .await
        .unwrap();

    let order = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::Checkout {
                cart_id: cart.cart_id.clone(),
            },
        ))
        .await
        .snapshot
        .unwrap();
    let intent = state
        .gateway
        .create_payment_intent(order.total_price, &order.currency, "acc-2")
        .await
        .unwrap();
    state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::CreatePaymentIntent {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id.clone(),
                amount: order.total_price,
            },
        ))
        .await;
    state
        .orders
        .execute_command(OrderCommand::new(
            ActorContext::system(),
            OrderCommandPayload::RecordPayment {
                order_id: order.order_id.clone(),
                intent_id: intent.intent_id,
                outcome: PaymentOutcome::Succeeded,
            },
        ))
        .await;
    let available_after_sale = state
        .ledger
        .get(&listing)
        .unwrap()
        .unwrap()
        .quantity_available;
    assert_eq!(available_after_sale, 7);

    // Over-balance refund is rejected whole, never partially applied
    let too_much = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::RequestRefund {
                order_id: order.order_id.clone(),
                item_id: None,
                amount: 90.0 + 1.0,
                reason: "refund everything and then some".into(),
            },
        ))
        .await;
    assert!(!too_much.success);
    let snapshot = state.orders.get_order(&order.order_id, &actor).unwrap();
    assert_eq!(snapshot.refund_total, 0.0);
    assert!(snapshot.refunds.is_empty());

    // Customer request parks as pending; owner approval applies it
    let requested = state
        .orders
        .execute_command(OrderCommand::new(
            actor.clone(),
            OrderCommandPayload::RequestRefund {
                order_id: order.order_id.clone(),
                item_id: None,
                amount: 90.0,
                reason: "not as described".into(),
            },
        ))
        .await;
    assert!(requested.success, "request failed: {:?}", requested.error);
    let snapshot = requested.snapshot.unwrap();
    assert_eq!(snapshot.refund_total, 0.0);
    let refund_id = snapshot.refunds[0].refund_id.clone();

    let store = ActorContext::store_owner("owner-1");
    let approved = state
        .orders
        .execute_command(OrderCommand::new(
            store,
            OrderCommandPayload::ApproveRefund {
                order_id: order.order_id.clone(),
                refund_id,
            },
        ))
        .await;
    assert!(approved.success, "approve failed: {:?}", approved.error);
    let snapshot = approved.snapshot.unwrap();
    assert_eq!(snapshot.status, OrderStatus::Refunded);
    assert_eq!(snapshot.payment_status, PaymentStatus::Refunded);
    assert_eq!(snapshot.refund_total, 90.0);

    // Refund does not restock; that is an explicit ledger operation
    let record = state.ledger.get(&listing).unwrap().unwrap();
    assert_eq!(record.quantity_available, available_after_sale);
    state
        .ledger
        .restock_returned(&listing, 3, &order.order_id, &ActorContext::store_owner("owner-1"))
        .unwrap();
    let record = state.ledger.get(&listing).unwrap().unwrap();
    assert_eq!(record.quantity_available, available_after_sale + 3);
    assert!(state.ledger.reconcile(&listing).unwrap().consistent);
}

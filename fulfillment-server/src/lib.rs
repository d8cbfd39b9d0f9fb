//! Hermit Fulfillment Server - standalone order fulfillment engine
//!
//! # Architecture overview
//!
//! The engine extracts the cart → reservation → checkout → payment →
//! shipment → refund workflow into one service:
//!
//! - **storage** (`storage`): single redb database for all fulfillment
//!   state; multi-entity operations commit in one transaction
//! - **inventory** (`inventory`): the ledger - atomic reserve / release /
//!   commit-consumption with an append-only transaction log
//! - **carts** (`carts`): cart aggregate mirroring reservations 1:1
//! - **coupons** (`coupons`): pure discount evaluation and stacking
//! - **shipping** (`shipping`): TTL-cached rate resolution
//! - **payments** (`payments`): payment gateway client (no auto-retry)
//! - **orders** (`orders`): event-sourced order state machine
//! - **db** (`db`): SurrealDB repositories for reference data
//! - **api** (`api`): HTTP surface
//!
//! # Module structure
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── storage/       # redb engine storage
//! ├── inventory/     # inventory ledger
//! ├── carts/         # cart aggregate
//! ├── coupons/       # coupon evaluator
//! ├── shipping/      # rate resolver + TTL cache
//! ├── payments/      # payment gateway client
//! ├── orders/        # event-sourced order state machine
//! ├── db/            # reference-data repositories
//! ├── services/      # catalog metadata cache
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation
//! ```

pub mod api;
pub mod carts;
pub mod core;
pub mod coupons;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod services;
pub mod shipping;
pub mod storage;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use inventory::InventoryLedger;
pub use orders::OrdersManager;
pub use storage::EngineStorage;
pub use utils::{init_logger, init_logger_with_file};

/// Load environment and initialize logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(std::env::var("LOG_LEVEL").ok().as_deref(), log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __  __                    _ __
   / / / /__  _________ ___  (_) /_
  / /_/ / _ \/ ___/ __ `__ \/ / __/
 / __  /  __/ /  / / / / / / / /_
/_/ /_/\___/_/  /_/ /_/ /_/_/\__/
    "#
    );
}

//! Server state - shared handles to every service
//!
//! `ServerState` is the engine's composition root: it owns the storage,
//! the ledger, the managers and the external-service clients behind `Arc`s
//! so axum handlers and background tasks share them cheaply.

use super::config::Config;
use super::error::Result;
use super::tasks::BackgroundTasks;
use crate::carts::CartManager;
use crate::db::DbService;
use crate::db::repository::{CouponRepository, ListingRepository};
use crate::inventory::InventoryLedger;
use crate::orders::OrdersManager;
use crate::payments::{HttpPaymentGateway, MockPaymentGateway, PaymentGateway};
use crate::services::CatalogService;
use crate::shipping::{HttpRateProvider, RateCache, RateProvider, RateResolver, StaticRateProvider};
use crate::storage::EngineStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: EngineStorage,
    pub ledger: Arc<InventoryLedger>,
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<CartManager>,
    pub orders: Arc<OrdersManager>,
    pub rates: Arc<RateResolver>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub listing_repo: ListingRepository,
    pub coupon_repo: CouponRepository,
    tasks: Arc<Mutex<Option<BackgroundTasks>>>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Initialize all services against on-disk storage
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = EngineStorage::open(format!("{}/engine.redb", config.work_dir))?;
        let db = DbService::new(&format!("{}/catalog", config.work_dir)).await?;
        Self::build(config, storage, db)
    }

    /// Initialize against in-memory storage (tests, ephemeral dev runs)
    pub async fn initialize_in_memory(config: &Config) -> Result<Self> {
        let storage = EngineStorage::open_in_memory()?;
        let db = DbService::new_in_memory().await?;
        Self::build(config, storage, db)
    }

    fn build(config: &Config, storage: EngineStorage, db: DbService) -> Result<Self> {
        let ledger = Arc::new(InventoryLedger::new(storage.clone()));
        let catalog = Arc::new(CatalogService::new(db.db.clone()));
        let listing_repo = ListingRepository::new(db.db.clone());
        let coupon_repo = CouponRepository::new(db.db.clone());

        let carts = Arc::new(CartManager::new(
            storage.clone(),
            catalog.clone(),
            coupon_repo.clone(),
            config.currency.clone(),
            config.tax_rate_percent,
            config.guest_cart_ttl_ms(),
        ));
        let orders = Arc::new(OrdersManager::new(storage.clone(), config.timezone));

        let provider: Arc<dyn RateProvider> = match &config.rate_provider_url {
            Some(url) => Arc::new(HttpRateProvider::new(
                url.clone(),
                Duration::from_millis(config.rate_timeout_ms),
            )),
            None => {
                tracing::warn!("RATE_PROVIDER_URL unset, using static shipping rates");
                Arc::new(StaticRateProvider::default())
            }
        };
        let rates = Arc::new(RateResolver::new(
            provider,
            RateCache::new(Duration::from_secs(config.rate_cache_ttl_hours * 3600)),
            config.origin_postal_code.clone(),
        ));

        let gateway: Arc<dyn PaymentGateway> = match &config.payment_gateway_url {
            Some(url) => Arc::new(HttpPaymentGateway::new(
                url.clone(),
                Duration::from_millis(config.payment_timeout_ms),
            )),
            None => {
                tracing::warn!("PAYMENT_GATEWAY_URL unset, using mock payment gateway");
                Arc::new(MockPaymentGateway)
            }
        };

        Ok(Self {
            config: Arc::new(config.clone()),
            storage,
            ledger,
            catalog,
            carts,
            orders,
            rates,
            gateway,
            listing_repo,
            coupon_repo,
            tasks: Arc::new(Mutex::new(None)),
        })
    }

    /// Start the expiry sweep and snapshot verification loops
    pub fn start_background_tasks(&self) {
        let mut tasks = BackgroundTasks::new();

        let carts = self.carts.clone();
        tasks.spawn_periodic(
            "cart_expiry_sweep",
            Duration::from_secs(self.config.cart_sweep_interval_secs),
            move || match carts.sweep_expired() {
                Ok(outcome) if outcome.expired + outcome.abandoned > 0 => {
                    tracing::info!(
                        expired = outcome.expired,
                        abandoned = outcome.abandoned,
                        "Cart sweep released reservations"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Cart sweep failed"),
            },
        );

        let storage = self.storage.clone();
        tasks.spawn_periodic(
            "snapshot_verify",
            Duration::from_secs(self.config.verify_interval_secs),
            move || {
                if let Err(e) = crate::orders::verify_snapshots(&storage) {
                    tracing::error!(error = %e, "Snapshot verification failed");
                }
            },
        );

        *self.tasks.lock() = Some(tasks);
    }

    /// Stop background tasks within the shutdown budget
    pub async fn shutdown(&self) {
        let tasks = self.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks
                .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
                .await;
        }
    }
}

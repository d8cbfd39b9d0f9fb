//! Database module
//!
//! Embedded SurrealDB holding reference data (listings, coupons) behind
//! repositories. Fulfillment state (inventory, carts, orders) lives in the
//! redb engine storage instead, where cross-entity atomicity is required.

pub mod models;
pub mod repository;

use shared::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const NAMESPACE: &str = "hermit";
const DATABASE: &str = "catalog";

/// Database service - owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database
    pub async fn new(path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<surrealdb::engine::local::RocksDb>(path)
            .await
            .map_err(|e| AppError::storage(format!("Failed to open database: {e}")))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::storage(format!("Failed to select namespace: {e}")))?;
        tracing::info!(path = %path, "Catalog database opened");
        Ok(Self { db })
    }

    /// Open an in-memory database (tests, ephemeral dev runs)
    pub async fn new_in_memory() -> Result<Self, AppError> {
        let db = Surreal::new::<surrealdb::engine::local::Mem>(())
            .await
            .map_err(|e| AppError::storage(format!("Failed to open database: {e}")))?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::storage(format!("Failed to select namespace: {e}")))?;
        Ok(Self { db })
    }
}

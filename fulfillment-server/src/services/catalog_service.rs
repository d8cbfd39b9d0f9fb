//! Catalog service - listing metadata cache for purchasability checks
//!
//! Cart mutations need listing metadata (price, published/deleted flags,
//! weight) on every call; this service keeps a read-through DashMap in
//! front of the listing repository so the hot path stays off the database.

use crate::db::models::Listing;
use crate::db::repository::ListingRepository;
use dashmap::DashMap;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Cached listing metadata - the subset the engine needs
#[derive(Debug, Clone)]
pub struct ListingMeta {
    pub listing_id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub published: bool,
    pub deleted: bool,
    pub is_digital: bool,
    pub weight: Option<f64>,
    pub dimensions: Option<[f64; 3]>,
}

impl ListingMeta {
    /// A listing can enter a cart only while published and not deleted
    /// (stock is the ledger's concern, not the catalog's)
    pub fn is_purchasable(&self) -> bool {
        self.published && !self.deleted
    }
}

impl From<&Listing> for ListingMeta {
    fn from(listing: &Listing) -> Self {
        Self {
            listing_id: listing.listing_id.clone(),
            title: listing.title.clone(),
            price: listing.price,
            currency: listing.currency.clone(),
            published: listing.published,
            deleted: listing.deleted,
            is_digital: listing.is_digital,
            weight: listing.weight,
            dimensions: listing.dimensions,
        }
    }
}

/// Listing metadata cache
pub struct CatalogService {
    repo: ListingRepository,
    cache: DashMap<String, ListingMeta>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl CatalogService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            repo: ListingRepository::new(db),
            cache: DashMap::new(),
        }
    }

    /// Get listing metadata, read-through
    pub async fn get_meta(&self, listing_id: &str) -> Option<ListingMeta> {
        if let Some(meta) = self.cache.get(listing_id) {
            return Some(meta.clone());
        }
        match self.repo.find_by_id(listing_id).await {
            Ok(Some(listing)) => {
                let meta = ListingMeta::from(&listing);
                self.cache.insert(listing_id.to_string(), meta.clone());
                Some(meta)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(listing_id = %listing_id, error = %e, "Catalog lookup failed");
                None
            }
        }
    }

    /// Drop a cached entry after a listing mutation
    pub fn invalidate(&self, listing_id: &str) {
        self.cache.remove(listing_id);
    }
}

//! Listing repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Listing, ListingCreate, ListingUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "listing";

#[derive(Clone)]
pub struct ListingRepository {
    base: BaseRepository,
}

impl ListingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All non-deleted listings, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Listing>> {
        let listings: Vec<Listing> = self
            .base
            .db()
            .query("SELECT * FROM listing WHERE deleted = false ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(listings)
    }

    pub async fn find_by_id(&self, listing_id: &str) -> RepoResult<Option<Listing>> {
        let listing: Option<Listing> = self.base.db().select((TABLE, listing_id)).await?;
        Ok(listing)
    }

    pub async fn create(&self, data: ListingCreate) -> RepoResult<Listing> {
        let now = chrono::Utc::now().timestamp_millis();
        let listing = Listing {
            listing_id: uuid::Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            price: data.price,
            currency: data.currency.unwrap_or_else(|| "USD".to_string()),
            published: data.published,
            deleted: false,
            is_digital: data.is_digital,
            weight: data.weight,
            dimensions: data.dimensions,
            seller_id: data.seller_id,
            image_url: data.image_url,
            created_at: now,
            updated_at: now,
        };
        let created: Option<Listing> = self
            .base
            .db()
            .create((TABLE, listing.listing_id.clone()))
            .content(listing)
            .await?;
        created.ok_or_else(|| RepoError::Database("create returned no record".into()))
    }

    /// Apply only the explicitly set fields of the update
    pub async fn update(&self, listing_id: &str, data: ListingUpdate) -> RepoResult<Listing> {
        let mut listing = self
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Listing {}", listing_id)))?;

        if let Some(title) = data.title {
            listing.title = title;
        }
        if let Some(description) = data.description {
            // Explicit null clears the field
            listing.description = description;
        }
        if let Some(price) = data.price {
            if price < 0.0 {
                return Err(RepoError::Validation("price must be non-negative".into()));
            }
            listing.price = price;
        }
        if let Some(published) = data.published {
            listing.published = published;
        }
        if let Some(deleted) = data.deleted {
            listing.deleted = deleted;
        }
        if let Some(is_digital) = data.is_digital {
            listing.is_digital = is_digital;
        }
        if let Some(weight) = data.weight {
            listing.weight = Some(weight);
        }
        if let Some(dimensions) = data.dimensions {
            listing.dimensions = Some(dimensions);
        }
        if let Some(image_url) = data.image_url {
            listing.image_url = Some(image_url);
        }
        listing.updated_at = chrono::Utc::now().timestamp_millis();

        let updated: Option<Listing> = self
            .base
            .db()
            .update((TABLE, listing_id))
            .content(listing)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Listing {}", listing_id)))
    }

    /// Soft-delete: the listing stops being purchasable but stays referenced
    /// by existing carts and orders
    pub async fn delete(&self, listing_id: &str) -> RepoResult<bool> {
        let update = ListingUpdate {
            deleted: Some(true),
            published: Some(false),
            ..Default::default()
        };
        self.update(listing_id, update).await?;
        Ok(true)
    }
}

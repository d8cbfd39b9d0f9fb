//! Listing catalog model

use serde::{Deserialize, Serialize};

/// A marketplace listing
///
/// The engine only reads catalog data for purchasability checks and price
/// snapshots; stock is tracked by the inventory ledger, images live in
/// object storage (the engine stores URLs only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub published: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_digital: bool,
    /// Unit weight for shipping quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Package dimensions (length, width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create DTO
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct ListingCreate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub currency: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub is_digital: bool,
    pub weight: Option<f64>,
    pub dimensions: Option<[f64; 3]>,
    pub seller_id: Option<String>,
    pub image_url: Option<String>,
    /// Seeds the inventory ledger via an initial adjustment
    #[serde(default)]
    pub initial_quantity: i64,
    #[serde(default)]
    pub restock_threshold: i64,
}

/// Update DTO - only explicitly set fields are applied
///
/// `None` means "leave unchanged"; optional columns that must support
/// explicit clearing use a nested Option (absent = unchanged,
/// null = clear, value = set).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub published: Option<bool>,
    pub deleted: Option<bool>,
    pub is_digital: Option<bool>,
    pub weight: Option<f64>,
    pub dimensions: Option<[f64; 3]>,
    pub image_url: Option<String>,
}

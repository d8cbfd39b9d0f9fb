//! Database models for reference data

mod coupon;
mod listing;

pub use coupon::{Coupon, CouponCreate};
pub use listing::{Listing, ListingCreate, ListingUpdate};

use serde::{Deserialize, Deserializer};

/// Deserialize a doubly-optional field: absent = `None` (leave unchanged),
/// `null` = `Some(None)` (clear), value = `Some(Some(v))` (set)
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

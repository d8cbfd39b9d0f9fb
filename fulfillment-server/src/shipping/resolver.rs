//! Shipping rate resolver
//!
//! Computes the composite cache key from a cart's physical items, reads
//! through the TTL cache, and sorts quotes ascending by cost. All-digital
//! carts never reach the provider: they get one synthesized free rate.

use super::cache::{RateCache, RateCacheKey};
use super::provider::{Parcel, ProviderError, RateOption, RateProvider};
use shared::cart::CartSnapshot;
use std::sync::Arc;

/// Default unit weight when an item has none recorded
///
/// Matches the coarse heuristic of summing weights with a fallback of 1;
/// quotes for mixed carts are approximate by design.
pub const DEFAULT_ITEM_WEIGHT: f64 = 1.0;

/// The synthesized rate for all-digital carts
pub fn digital_rate() -> RateOption {
    RateOption {
        carrier: "N/A".to_string(),
        service: "digital".to_string(),
        amount: 0.0,
        transit_days: None,
    }
}

/// Rate resolver - cache in front of the provider
pub struct RateResolver {
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
    origin: String,
}

impl std::fmt::Debug for RateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateResolver")
            .field("origin", &self.origin)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RateResolver {
    pub fn new(provider: Arc<dyn RateProvider>, cache: RateCache, origin: impl Into<String>) -> Self {
        Self {
            provider,
            cache,
            origin: origin.into(),
        }
    }

    /// Aggregate a cart's physical items into one parcel
    ///
    /// Items without a recorded weight count as [`DEFAULT_ITEM_WEIGHT`];
    /// dimensions are not tracked per cart item, so the parcel carries none.
    fn parcel_for(cart: &CartSnapshot) -> Parcel {
        let weight: f64 = cart
            .items
            .iter()
            .filter(|i| !i.is_digital)
            .map(|i| i.weight.unwrap_or(DEFAULT_ITEM_WEIGHT) * i.quantity as f64)
            .sum();
        Parcel {
            weight,
            length: None,
            width: None,
            height: None,
        }
    }

    /// Get rate options for a cart shipping to `destination`
    ///
    /// Read-through: a non-expired cache entry short-circuits the provider;
    /// on a miss the provider's quotes are cached under the fixed TTL.
    /// Returned rates are sorted ascending by amount.
    pub async fn get_rates(
        &self,
        cart: &CartSnapshot,
        destination: &str,
    ) -> Result<Vec<RateOption>, ProviderError> {
        if cart.all_digital() {
            return Ok(vec![digital_rate()]);
        }

        let parcel = Self::parcel_for(cart);
        let key = RateCacheKey::new(&self.origin, destination, parcel.weight, [0.0; 3]);

        if let Some(mut rates) = self.cache.get(&key) {
            tracing::debug!(cart_id = %cart.cart_id, "Shipping rates served from cache");
            sort_rates(&mut rates);
            return Ok(rates);
        }

        let mut rates = self
            .provider
            .quote(&key.origin, &key.destination, std::slice::from_ref(&parcel))
            .await?;
        sort_rates(&mut rates);
        self.cache.insert(key, rates.clone());
        Ok(rates)
    }
}

fn sort_rates(rates: &mut [RateOption]) {
    rates.sort_by(|a, b| a.amount.partial_cmp(&b.amount).unwrap_or(std::cmp::Ordering::Equal));
}

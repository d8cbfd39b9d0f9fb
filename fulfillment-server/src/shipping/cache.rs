//! TTL cache for shipping rate quotes
//!
//! Entries are keyed by the normalized (origin, destination, weight,
//! dimensions) composite and expire at a fixed TTL; staleness is bounded by
//! the TTL, not by invalidation. The key deliberately ignores individual
//! item composition - carts with different item mixes but equal aggregate
//! weight/dims share an entry. Known approximation, accepted for hit rate.

use super::provider::RateOption;
use dashmap::DashMap;
use std::time::Duration;

/// Composite cache key
///
/// Weight is stored in deci-units and dimensions in centi-units so the key
/// is exact-match hashable without float equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateCacheKey {
    pub origin: String,
    pub destination: String,
    pub weight_deci: u64,
    pub dims_centi: [u64; 3],
}

impl RateCacheKey {
    pub fn new(origin: &str, destination: &str, total_weight: f64, dims: [f64; 3]) -> Self {
        Self {
            origin: normalize_postal(origin),
            destination: normalize_postal(destination),
            weight_deci: (total_weight.max(0.0) * 10.0).round() as u64,
            dims_centi: dims.map(|d| (d.max(0.0) * 100.0).round() as u64),
        }
    }
}

/// Normalize a postal code: uppercase, strip spaces
pub fn normalize_postal(postal: &str) -> String {
    postal
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone)]
struct CachedRates {
    rates: Vec<RateOption>,
    expires_at: i64,
}

/// Read-many/write-occasional TTL cache
///
/// Insert-or-replace per key is atomic via the map entry; no further
/// locking is needed.
pub struct RateCache {
    entries: DashMap<RateCacheKey, CachedRates>,
    ttl_ms: i64,
}

impl std::fmt::Debug for RateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateCache")
            .field("entries", &self.entries.len())
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms: ttl.as_millis() as i64,
        }
    }

    /// Get non-expired rates; expired entries are dropped on read
    pub fn get(&self, key: &RateCacheKey) -> Option<Vec<RateOption>> {
        let now = chrono::Utc::now().timestamp_millis();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.rates.clone());
            }
        }
        self.entries.remove_if(key, |_, v| v.expires_at <= now);
        None
    }

    /// Insert (or replace) rates under the fixed TTL
    pub fn insert(&self, key: RateCacheKey, rates: Vec<RateOption>) {
        let expires_at = chrono::Utc::now().timestamp_millis() + self.ttl_ms;
        self.entries.insert(key, CachedRates { rates, expires_at });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> Vec<RateOption> {
        vec![RateOption {
            carrier: "POSTAL".into(),
            service: "ground".into(),
            amount: 5.0,
            transit_days: Some(4),
        }]
    }

    #[test]
    fn postal_normalization() {
        assert_eq!(normalize_postal("  sw1a 1aa "), "SW1A1AA");
        assert_eq!(normalize_postal("08001"), "08001");
    }

    #[test]
    fn key_ignores_postal_formatting() {
        let a = RateCacheKey::new("sw1a 1aa", "08001", 2.0, [10.0, 5.0, 3.0]);
        let b = RateCacheKey::new("SW1A1AA", " 08001", 2.0, [10.0, 5.0, 3.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn key_distinguishes_weight() {
        let a = RateCacheKey::new("A", "B", 2.0, [0.0; 3]);
        let b = RateCacheKey::new("A", "B", 2.1, [0.0; 3]);
        assert_ne!(a, b);
    }

    #[test]
    fn hit_within_ttl() {
        let cache = RateCache::new(Duration::from_secs(60));
        let key = RateCacheKey::new("A", "B", 1.0, [0.0; 3]);
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), rates());
        assert_eq!(cache.get(&key).unwrap().len(), 1);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = RateCache::new(Duration::from_millis(0));
        let key = RateCacheKey::new("A", "B", 1.0, [0.0; 3]);
        cache.insert(key.clone(), rates());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
        // Dropped on read
        assert!(cache.is_empty());
    }
}

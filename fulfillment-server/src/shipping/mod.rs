//! Shipping rate resolution
//!
//! Read-through TTL cache in front of an external rate provider. All-digital
//! carts bypass the provider entirely and get a single free "digital" rate.

pub mod cache;
pub mod provider;
pub mod resolver;

pub use cache::{RateCache, RateCacheKey};
pub use provider::{HttpRateProvider, Parcel, ProviderError, RateOption, RateProvider, StaticRateProvider};
pub use resolver::RateResolver;

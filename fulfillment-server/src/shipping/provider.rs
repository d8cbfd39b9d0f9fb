//! Rate provider interface
//!
//! The external rate provider sits behind a trait: an HTTP implementation
//! for production and a static one for dev and tests. Quotes are idempotent
//! reads, so the HTTP provider retries once on transport failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A parcel to quote: aggregate weight and optional dimensions
#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A quoted rate option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateOption {
    pub carrier: String,
    pub service: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_days: Option<i32>,
}

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rate provider request failed: {0}")]
    Transport(String),

    #[error("Rate provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ProviderError> for shared::AppError {
    fn from(err: ProviderError) -> Self {
        shared::AppError::external_service("rate_provider", err.to_string())
    }
}

/// External shipping rate provider
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
        parcels: &[Parcel],
    ) -> Result<Vec<RateOption>, ProviderError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Serialize)]
struct QuoteRequest<'a> {
    origin: &'a str,
    destination: &'a str,
    parcels: &'a [Parcel],
}

#[derive(Deserialize)]
struct QuoteResponse {
    rates: Vec<RateOption>,
}

/// HTTP rate provider client
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn quote_once(
        &self,
        request: &QuoteRequest<'_>,
    ) -> Result<Vec<RateOption>, ProviderError> {
        let url = format!("{}/rates", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::InvalidResponse(format!(
                "status {}",
                response.status()
            )));
        }
        let body: QuoteResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(body.rates)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
        parcels: &[Parcel],
    ) -> Result<Vec<RateOption>, ProviderError> {
        let request = QuoteRequest {
            origin,
            destination,
            parcels,
        };
        // One retry: quotes are read-only and safe to repeat
        match self.quote_once(&request).await {
            Ok(rates) => Ok(rates),
            Err(first) => {
                tracing::warn!(error = %first, "Rate quote failed, retrying once");
                self.quote_once(&request).await
            }
        }
    }
}

// ============================================================================
// Static implementation (dev/tests)
// ============================================================================

/// Fixed-rate provider for dev runs and tests
pub struct StaticRateProvider {
    rates: Vec<RateOption>,
}

impl StaticRateProvider {
    pub fn new(rates: Vec<RateOption>) -> Self {
        Self { rates }
    }
}

impl Default for StaticRateProvider {
    fn default() -> Self {
        Self::new(vec![
            RateOption {
                carrier: "POSTAL".to_string(),
                service: "ground".to_string(),
                amount: 6.95,
                transit_days: Some(5),
            },
            RateOption {
                carrier: "POSTAL".to_string(),
                service: "express".to_string(),
                amount: 14.5,
                transit_days: Some(2),
            },
        ])
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn quote(
        &self,
        _origin: &str,
        _destination: &str,
        _parcels: &[Parcel],
    ) -> Result<Vec<RateOption>, ProviderError> {
        Ok(self.rates.clone())
    }
}

//! Payment gateway client
//!
//! Money-moving calls are never retried automatically: a transport failure
//! is surfaced to the caller, who decides whether to retry manually. The
//! gateway is only ever called outside storage transactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A created payment intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    /// Opaque secret the web front end hands to the payment form
    pub client_secret: String,
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway request failed: {0}")]
    Transport(String),

    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
}

impl From<GatewayError> for shared::AppError {
    fn from(err: GatewayError) -> Self {
        shared::AppError::external_service("payment_gateway", err.to_string())
    }
}

/// External payment processor
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the given amount
    ///
    /// No automatic retry - double-created intents risk double charges.
    async fn create_payment_intent(
        &self,
        amount: f64,
        currency: &str,
        customer: &str,
    ) -> Result<PaymentIntent, GatewayError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Serialize)]
struct IntentRequest<'a> {
    amount: f64,
    currency: &'a str,
    customer: &'a str,
}

#[derive(Deserialize)]
struct IntentResponse {
    intent_id: String,
    client_secret: String,
}

/// HTTP payment gateway client
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
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
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: f64,
        currency: &str,
        customer: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/payment_intents", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&IntentRequest {
                amount,
                currency,
                customer,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("status {status}: {body}")));
        }
        let body: IntentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(PaymentIntent {
            intent_id: body.intent_id,
            client_secret: body.client_secret,
        })
    }
}

// ============================================================================
// Mock implementation (dev/tests)
// ============================================================================

/// Always-succeeding gateway for dev runs and tests
#[derive(Debug, Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: f64,
        currency: &str,
        _customer: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let intent_id = format!("pi_{}", uuid::Uuid::new_v4().simple());
        tracing::debug!(intent_id = %intent_id, amount, currency, "Mock payment intent created");
        Ok(PaymentIntent {
            client_secret: format!("{intent_id}_secret"),
            intent_id,
        })
    }
}

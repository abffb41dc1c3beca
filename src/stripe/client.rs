//! Checkout Session creation against the Stripe REST API
//!
//! Session creation happens *before* the store's "attach session id"
//! mutation, never inside it, so a slow provider call cannot hold the write
//! gate. Requests carry the order's idempotency key in the
//! `Idempotency-Key` header: even if the service retries, Stripe returns
//! the same session instead of opening a second one.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::stripe::config::StripeConfig;

/// Parameters for one Checkout Session
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// Charge amount in minor currency units
    pub amount_cents: i64,
    /// Lower-cased ISO currency code
    pub currency: String,
    /// Product label shown on the Stripe-hosted page
    pub product_name: String,
    /// Reading the session pays for (propagated as metadata)
    pub reading_id: String,
    /// Order the session pays for (propagated as metadata)
    pub order_id: String,
    /// The order's idempotency key; sent as the `Idempotency-Key` header
    pub idempotency_key: String,
    /// Redirect target on successful payment
    pub success_url: String,
    /// Redirect target on cancellation
    pub cancel_url: String,
}

/// A created Checkout Session
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionCreated {
    /// Session id (`cs_...`)
    pub id: String,
    /// Hosted payment page URL, when returned
    #[serde(default)]
    pub url: Option<String>,
}

/// Payment-provider collaborator
///
/// The only provider operation the core consumes: create a payment session
/// for an amount/currency/idempotency-key and hand back its id. Completion
/// arrives later through the signed webhook, not through this trait.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session; errors are retryable and commit no state
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionCreated, ProviderError>;
}

/// Stripe-backed [`PaymentProvider`]
pub struct StripeCheckoutClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeCheckoutClient {
    /// Build a client with rustls and the configured request deadline
    pub fn new(config: StripeConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl PaymentProvider for StripeCheckoutClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionCreated, ProviderError> {
        // The Checkout Sessions endpoint takes form-encoded nested params.
        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            (
                "metadata[reading_request_id]",
                request.reading_id.clone(),
            ),
            ("metadata[order_id]", request.order_id.clone()),
            (
                "metadata[idempotency_key]",
                request.idempotency_key.clone(),
            ),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.config.timeout)
                } else {
                    ProviderError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSessionCreated>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))
    }
}

impl std::fmt::Debug for StripeCheckoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCheckoutClient")
            .field("api_base", &self.config.api_base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_test_config() {
        let client = StripeCheckoutClient::new(StripeConfig::test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_created_session_parses_without_url() {
        let created: CheckoutSessionCreated = serde_json::from_str(r#"{"id":"cs_1"}"#).unwrap();
        assert_eq!(created.id, "cs_1");
        assert!(created.url.is_none());
    }
}

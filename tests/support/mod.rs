//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use soulcross_paywall::checkout::{OrderManager, WebhookReconciler};
use soulcross_paywall::config::AppConfig;
use soulcross_paywall::error::ProviderError;
use soulcross_paywall::handlers::{self, AppState};
use soulcross_paywall::metrics::PaywallMetrics;
use soulcross_paywall::reading::{
    ContentGenerator, RawPersonInput, RawReadingInput, ReadingManager, TemplateGenerator,
};
use soulcross_paywall::store::PaywallStore;
use soulcross_paywall::stripe::{
    CheckoutSessionCreated, CheckoutSessionRequest, PaymentProvider, SignatureVerifier,
};

/// Signing secret shared by the webhook fixtures
pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// Payment provider double: hands out sequential session ids and counts calls
pub struct MockPaymentProvider {
    pub calls: AtomicU32,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    pub fn session_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionCreated, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSessionCreated {
            id: format!("cs_mock_{n}"),
            url: Some(format!("https://checkout.stripe.test/{}", request.order_id)),
        })
    }
}

/// Build a full application state over an in-memory store
pub fn build_state() -> (Arc<AppState>, Arc<MockPaymentProvider>, Arc<PaywallStore>) {
    let store = Arc::new(PaywallStore::in_memory());
    let generator: Arc<dyn ContentGenerator> = Arc::new(TemplateGenerator);
    let payments = Arc::new(MockPaymentProvider::new());
    let provider: Arc<dyn PaymentProvider> = payments.clone();

    let state = Arc::new(AppState {
        config: AppConfig::test_config(),
        store: store.clone(),
        readings: ReadingManager::new(store.clone(), generator.clone()),
        orders: OrderManager::new(store.clone(), generator.clone()),
        reconciler: WebhookReconciler::new(store.clone(), generator),
        payments: provider,
        verifier: SignatureVerifier::new(WEBHOOK_SECRET),
        metrics: Arc::new(PaywallMetrics::new()),
        started_at: Instant::now(),
    });

    (state, payments, store)
}

/// Compute a `stripe-signature` header for a payload
pub fn stripe_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let ts = timestamp.to_string();
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(ts.as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
}

/// Signature header for the shared test secret, stamped with the current time
pub fn signed_header(payload: &[u8]) -> String {
    stripe_signature(payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp())
}

pub fn raw_person(name: &str, birthday: &str) -> RawPersonInput {
    RawPersonInput {
        name: Some(name.to_string()),
        birthday: Some(birthday.to_string()),
        ..RawPersonInput::default()
    }
}

pub fn raw_input() -> RawReadingInput {
    RawReadingInput {
        person_a: Some(raw_person("Alice", "1990-01-01")),
        person_b: Some(raw_person("Bob", "1992-02-02")),
    }
}

/// Drive one request through a fresh router over the shared state
pub async fn send(
    state: Arc<AppState>,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let app = handlers::router(state);
    let response = app.oneshot(request).await.expect("request should complete");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");

    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

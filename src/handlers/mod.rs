// Allow missing docs in this module - HTTP wire types mirror the API docs
#![allow(missing_docs)]

//! HTTP surface of the paywall service
//!
//! Thin axum handlers over the core managers. Handlers translate wire
//! shapes, enforce the webhook signature gate, and bump metrics; every
//! state decision lives in the `reading`/`checkout` modules.

pub mod checkout;
pub mod readings;
pub mod status;
pub mod webhook;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::checkout::{OrderManager, WebhookReconciler};
use crate::config::AppConfig;
use crate::metrics::PaywallMetrics;
use crate::reading::ReadingManager;
use crate::store::PaywallStore;
use crate::stripe::{PaymentProvider, SignatureVerifier};

/// Shared service state handed to every handler
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// The durable store (for status counts)
    pub store: Arc<PaywallStore>,
    /// Reading request manager
    pub readings: ReadingManager,
    /// Idempotency & order manager
    pub orders: OrderManager,
    /// Webhook reconciler
    pub reconciler: WebhookReconciler,
    /// Payment-provider collaborator
    pub payments: Arc<dyn PaymentProvider>,
    /// Webhook signature verifier
    pub verifier: SignatureVerifier,
    /// Metrics registry
    pub metrics: Arc<PaywallMetrics>,
    /// Service start time, for uptime reporting
    pub started_at: Instant,
}

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/preview", post(readings::create_preview))
        .route("/api/reading/:id", get(readings::fetch_reading))
        .route("/api/checkout", post(checkout::create_checkout))
        .route("/webhook/stripe", post(webhook::stripe_webhook))
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/metrics", get(status::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

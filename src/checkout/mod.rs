//! Checkout: idempotency keys, order management, and webhook reconciliation
//!
//! This module owns the order-state subsystem: deterministic idempotency-key
//! derivation (the sole deduplication mechanism for checkout creation), the
//! create-or-reuse order paths, payment-session attachment, and the
//! exactly-once reconciliation of payment-confirmation webhooks.

pub mod idempotency;
pub mod manager;
pub mod reconciler;

pub use idempotency::{checkout_idempotency_key, reading_idempotency_key};
pub use manager::{CheckoutUpsert, OrderManager};
pub use reconciler::{WebhookOutcome, WebhookReconciler};

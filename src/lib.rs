//! SoulCross Paywall - Order-State Service for Paid Readings
//!
//! This crate records reading requests, deduplicates checkout attempts with
//! deterministic idempotency keys, and reconciles asynchronous payment
//! webhooks so that paid content unlocks exactly once per order.
//!
//! # Architecture
//!
//! ```text
//! HTTP ──▶ handlers ──▶ OrderManager ──▶ PaywallStore (single writer)
//!              │              │                 │
//!              │              ▼                 ▼
//!              │      idempotency keys    atomic JSON snapshot
//!              ▼
//!      WebhookReconciler ◀── signed Stripe events (at-least-once)
//!              │
//!              ▼
//!      ContentGenerator (full content, exactly once per paid order)
//! ```
//!
//! # Core guarantees
//!
//! - **Idempotent checkout**: identical input + price always maps to the
//!   same order; no duplicate payment session is ever created.
//! - **Exactly-once unlock**: replayed webhook deliveries are no-ops; the
//!   paid transition and content materialization happen once.
//! - **Unlock gating**: full content is never exposed while the order is
//!   pending.
//! - **Atomic persistence**: every mutation is serialized and swapped into
//!   place atomically; a failed operation changes nothing.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod checkout;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod reading;
pub mod store;
pub mod stripe;

// Re-exports for convenience
pub use checkout::{CheckoutUpsert, OrderManager, WebhookOutcome, WebhookReconciler};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use reading::{ReadingManager, TemplateGenerator};
pub use store::{JsonFileBackend, MemoryBackend, PaywallStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

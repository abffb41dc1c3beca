// Allow missing docs in this module - stripe integration is internal
#![allow(missing_docs)]

//! Stripe Integration Module
//!
//! Everything that talks to, or is signed by, the payment provider:
//!
//! - **Signature Verification**: HMAC-SHA256 validation of the
//!   `stripe-signature` header, constant-time comparison, bounded timestamp
//!   tolerance. Fails closed: no payload is trusted before the signature
//!   checks out.
//! - **Event Types**: the webhook envelope and the typed
//!   `checkout.session.completed` extraction the reconciler consumes.
//! - **Checkout Client**: Checkout Session creation against the Stripe REST
//!   API, carrying the order's idempotency key as the `Idempotency-Key`
//!   header so the provider deduplicates on its side too.
//!
//! # Security
//!
//! - Signing secret and API key are loaded from the environment
//! - Constant-time signature comparison to prevent timing attacks
//! - Handlers must verify against the raw request body, before any JSON
//!   parsing

pub mod client;
pub mod config;
pub mod events;
pub mod signature;

// Re-export commonly used items
pub use client::{
    CheckoutSessionCreated, CheckoutSessionRequest, PaymentProvider, StripeCheckoutClient,
};
pub use config::StripeConfig;
pub use events::{CheckoutSession, CheckoutSessionEvent, StripeEvent, StripeEventType};
pub use signature::SignatureVerifier;

//! Stripe Event Types
//!
//! Strongly-typed representation of the webhook events this service
//! consumes. Only `checkout.session.completed` drives state; everything
//! else deserializes to [`StripeEventType::Unknown`] and is recorded as
//! ignored.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WebhookError;

/// Stripe event types we handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StripeEventType {
    /// A Checkout Session finished successfully
    #[serde(rename = "checkout.session.completed")]
    CheckoutSessionCompleted,

    /// Catch-all for events we don't explicitly handle
    #[serde(other)]
    Unknown,
}

impl FromStr for StripeEventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            _ => Self::Unknown,
        })
    }
}

impl StripeEventType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this is a known event type
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Generic Stripe event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (`evt_...`)
    pub id: String,

    /// Type of event
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time of event creation (Unix timestamp)
    #[serde(default)]
    pub created: i64,

    /// Whether this is a live mode event
    #[serde(default)]
    pub livemode: bool,

    /// Object containing event data
    pub data: EventData,
}

/// Event data container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    /// The actual event object (a checkout session, for the events we use)
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Parse from raw JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(bytes).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Get the typed event type
    pub fn typed_event_type(&self) -> StripeEventType {
        // Infallible error type means this can never fail
        StripeEventType::from_str(&self.event_type).unwrap()
    }

    /// Extract the checkout session from event data
    pub fn as_checkout_session(&self) -> Result<CheckoutSessionEvent, WebhookError> {
        match self.typed_event_type() {
            StripeEventType::CheckoutSessionCompleted => {
                let session: CheckoutSession = serde_json::from_value(self.data.object.clone())
                    .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

                Ok(CheckoutSessionEvent {
                    event_id: self.id.clone(),
                    session,
                })
            }
            _ => Err(WebhookError::InvalidPayload(format!(
                "Event {} is not a checkout session event",
                self.event_type
            ))),
        }
    }
}

/// Checkout session event with typed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionEvent {
    /// The event ID
    pub event_id: String,
    /// The checkout session object
    pub session: CheckoutSession,
}

/// Stripe checkout session object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Session ID (`cs_...`)
    pub id: String,
    /// Payment intent: a plain id, or an expanded object on some API
    /// versions; anything but a string collapses to `None`
    #[serde(default)]
    pub payment_intent: Option<serde_json::Value>,
    /// Payment status reported by the session, if present
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Metadata attached at session creation
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CheckoutSession {
    /// The payment-confirmation id, when delivered as a plain string
    pub fn payment_intent_id(&self) -> Option<String> {
        self.payment_intent
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

//! Persisted record types
//!
//! The durable snapshot holds four collections: reading requests, orders,
//! the append-only audit log, and the set of processed webhook event ids.
//! Everything here is plain serde data; all access goes through
//! [`PaywallStore`](super::PaywallStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::reading::{FullReading, PersonInput, PreviewReading};

/// Tier of a reading request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingMode {
    /// Free preview content only
    Preview,
    /// Paid full content (or pending payment for it)
    Full,
}

/// Payment status of an order
///
/// `Paid` is terminal: an order never transitions back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting payment confirmation
    Pending,
    /// Payment confirmed by the provider
    Paid,
}

impl OrderStatus {
    /// Whether the order has reached the terminal paid state
    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }
}

/// One analysis request for a pair of persons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRequestRecord {
    /// Opaque unique id, generated at creation
    pub id: String,
    /// Current tier
    pub mode: ReadingMode,
    /// First person's sanitized birth details
    pub person_a: PersonInput,
    /// Second person's sanitized birth details
    pub person_b: PersonInput,
    /// Preview-tier content, populated at creation
    pub preview_result: Option<PreviewReading>,
    /// Full-tier content; `Some` only after an associated order is paid
    pub full_result: Option<FullReading>,
    /// Durable marker: payment confirmed but full content not yet attached
    #[serde(default)]
    pub full_content_pending: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// One payment attempt for a reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Opaque unique id
    pub id: String,
    /// Owning reading request
    pub reading_request_id: String,
    /// External payment-session id, attached once the session is created
    pub stripe_session_id: Option<String>,
    /// External payment-confirmation id, attached when paid
    pub stripe_payment_intent_id: Option<String>,
    /// Current status
    pub status: OrderStatus,
    /// Deterministic digest of the logical request; unique across orders
    pub idempotency_key: String,
    /// Charge amount in minor currency units
    pub amount_cents: i64,
    /// ISO currency code, lower-cased
    pub currency: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit log entry
///
/// Written by every state-changing operation; never mutated, never deleted,
/// and never read back by business logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Opaque unique id
    pub id: String,
    /// Free-form tag, e.g. `checkout.requested`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Reading the event relates to, if any
    pub reading_request_id: Option<String>,
    /// Order the event relates to, if any
    pub order_id: Option<String>,
    /// Arbitrary structured context
    pub payload: Value,
    /// Append timestamp
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Build a new audit entry with a fresh id and the current time
    pub fn new(
        event_type: &str,
        reading_request_id: Option<&str>,
        order_id: Option<&str>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            reading_request_id: reading_request_id.map(str::to_string),
            order_id: order_id.map(str::to_string),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// The full persisted state, read and written as one consistent snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaywallDb {
    /// All reading requests, in creation order
    #[serde(default)]
    pub reading_requests: Vec<ReadingRequestRecord>,
    /// All orders, in creation order
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    /// Append-only audit log, in mutation-queue admission order
    #[serde(default)]
    pub events: Vec<EventRecord>,
    /// External webhook event ids that have already been applied
    #[serde(default)]
    pub processed_webhook_events: Vec<String>,
}

impl PaywallDb {
    /// Look up a reading request by id
    pub fn reading(&self, id: &str) -> Option<&ReadingRequestRecord> {
        self.reading_requests.iter().find(|r| r.id == id)
    }

    /// Mutable lookup of a reading request by id
    pub fn reading_mut(&mut self, id: &str) -> Option<&mut ReadingRequestRecord> {
        self.reading_requests.iter_mut().find(|r| r.id == id)
    }

    /// Look up an order by id
    pub fn order(&self, id: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Mutable lookup of an order by id
    pub fn order_mut(&mut self, id: &str) -> Option<&mut OrderRecord> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    /// Look up an order by its idempotency key (the deduplication natural key)
    pub fn order_by_key(&self, idempotency_key: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| o.idempotency_key == idempotency_key)
    }

    /// First order owned by the given reading, if any
    pub fn order_for_reading(&self, reading_id: &str) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| o.reading_request_id == reading_id)
    }

    /// Whether a webhook event id has already been applied
    pub fn is_webhook_processed(&self, event_id: &str) -> bool {
        self.processed_webhook_events.iter().any(|e| e == event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_roundtrip() {
        let db = PaywallDb::default();
        let bytes = serde_json::to_vec(&db).unwrap();
        let parsed: PaywallDb = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.reading_requests.is_empty());
        assert!(parsed.orders.is_empty());
        assert!(parsed.events.is_empty());
        assert!(parsed.processed_webhook_events.is_empty());
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        // Snapshots written before a collection existed must still load.
        let parsed: PaywallDb = serde_json::from_str(r#"{"orders": []}"#).unwrap();
        assert!(parsed.reading_requests.is_empty());
        assert!(parsed.processed_webhook_events.is_empty());
    }

    #[test]
    fn test_event_record_serializes_type_tag() {
        let event = EventRecord::new("checkout.requested", Some("r1"), None, Value::Null);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"checkout.requested\""));
        assert!(json.contains("\"reading_request_id\":\"r1\""));
    }

    #[test]
    fn test_order_status_terminality_helper() {
        assert!(OrderStatus::Paid.is_paid());
        assert!(!OrderStatus::Pending.is_paid());
    }
}

//! Idempotency-keyed order management
//!
//! Checkout creation is deduplicated purely by the derived idempotency key:
//! repeated submissions of the same logical reading at the same price reuse
//! the existing order, so no duplicate payment session is ever created for
//! the same request. Creating a reading+order pair happens inside a single
//! store mutation, so the pair is atomic.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::checkout::idempotency::reading_idempotency_key;
use crate::error::{Error, ProviderError, Result, StoreError};
use crate::reading::{ContentGenerator, ReadingInput};
use crate::store::{
    EventRecord, OrderRecord, OrderStatus, PaywallStore, ReadingMode, ReadingRequestRecord,
};

/// Result of a create-or-reuse checkout call
#[derive(Debug, Clone)]
pub struct CheckoutUpsert {
    /// The reading the order belongs to
    pub reading: ReadingRequestRecord,
    /// The (new or reused) order
    pub order: OrderRecord,
    /// `true` when an existing order was returned unchanged
    pub reused: bool,
}

/// Manager for order creation, reuse, and session attachment
#[derive(Clone)]
pub struct OrderManager {
    store: Arc<PaywallStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl OrderManager {
    /// Create a manager over the given store and content collaborator
    pub fn new(store: Arc<PaywallStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    /// Create a full-reading order from raw person data, or reuse the order
    /// matching the idempotency key
    ///
    /// On the create path a new reading (mode `full`, preview content
    /// attached, full content absent) and a pending order are persisted in
    /// one mutation. On the reuse path nothing changes except a
    /// `checkout.reused` audit entry.
    pub async fn create_or_reuse_full_order(
        &self,
        input: ReadingInput,
        idempotency_key: String,
        amount_cents: i64,
        currency: &str,
    ) -> Result<CheckoutUpsert> {
        // Rendered ahead of the gate; only consumed on the create path.
        let preview = self
            .generator
            .preview(&input)
            .map_err(|e| ProviderError::ContentGeneration(e.to_string()))?;
        let currency = currency.to_string();

        let upsert = self
            .store
            .mutate(move |db| {
                if let Some(order) = db.order_by_key(&idempotency_key).cloned() {
                    let reading = db
                        .reading(&order.reading_request_id)
                        .cloned()
                        .ok_or_else(|| {
                            StoreError::Corrupt("order exists without reading request".to_string())
                        })?;

                    db.events.push(EventRecord::new(
                        "checkout.reused",
                        Some(&reading.id),
                        Some(&order.id),
                        json!({
                            "idempotency_key": idempotency_key,
                            "order_status": order.status,
                        }),
                    ));

                    return Ok(CheckoutUpsert {
                        reading,
                        order,
                        reused: true,
                    });
                }

                let now = Utc::now();
                let reading = ReadingRequestRecord {
                    id: Uuid::new_v4().to_string(),
                    mode: ReadingMode::Full,
                    person_a: input.person_a,
                    person_b: input.person_b,
                    preview_result: Some(preview),
                    full_result: None,
                    full_content_pending: false,
                    created_at: now,
                    updated_at: now,
                };
                let order = OrderRecord {
                    id: Uuid::new_v4().to_string(),
                    reading_request_id: reading.id.clone(),
                    stripe_session_id: None,
                    stripe_payment_intent_id: None,
                    status: OrderStatus::Pending,
                    idempotency_key,
                    amount_cents,
                    currency,
                    created_at: now,
                    updated_at: now,
                };

                db.events.push(EventRecord::new(
                    "checkout.requested",
                    Some(&reading.id),
                    Some(&order.id),
                    json!({
                        "idempotency_key": order.idempotency_key,
                        "amount_cents": order.amount_cents,
                        "currency": order.currency,
                    }),
                ));
                db.reading_requests.push(reading.clone());
                db.orders.push(order.clone());

                Ok(CheckoutUpsert {
                    reading,
                    order,
                    reused: false,
                })
            })
            .await?;

        tracing::info!(
            order_id = %upsert.order.id,
            reading_id = %upsert.reading.id,
            reused = upsert.reused,
            "Checkout order upserted"
        );
        Ok(upsert)
    }

    /// Create or reuse an order for a reading that already exists
    ///
    /// This is the "previewed first, paid later" path: the key is derived
    /// from the reading id and price, so the caller does not resubmit birth
    /// data. Unknown reading ids fail with NotFound; this path never
    /// creates a reading implicitly. If the reading already carries full
    /// content the new order starts out `paid`.
    pub async fn create_or_reuse_order_for_existing_reading(
        &self,
        reading_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<CheckoutUpsert> {
        let reading_id = reading_id.to_string();
        let currency = currency.to_string();

        self.store
            .mutate(move |db| {
                let reading = db
                    .reading(&reading_id)
                    .cloned()
                    .ok_or_else(|| Error::ReadingNotFound(reading_id.clone()))?;

                let idempotency_key =
                    reading_idempotency_key(&reading.id, amount_cents, &currency);

                let existing = db.orders.iter().find(|o| {
                    o.reading_request_id == reading.id && o.idempotency_key == idempotency_key
                });
                if let Some(order) = existing.cloned() {
                    db.events.push(EventRecord::new(
                        "checkout.reused",
                        Some(&reading.id),
                        Some(&order.id),
                        json!({
                            "idempotency_key": order.idempotency_key,
                            "from_reading_id": true,
                        }),
                    ));
                    return Ok(CheckoutUpsert {
                        reading,
                        order,
                        reused: true,
                    });
                }

                let now = Utc::now();
                let order = OrderRecord {
                    id: Uuid::new_v4().to_string(),
                    reading_request_id: reading.id.clone(),
                    stripe_session_id: None,
                    stripe_payment_intent_id: None,
                    status: if reading.full_result.is_some() {
                        OrderStatus::Paid
                    } else {
                        OrderStatus::Pending
                    },
                    idempotency_key,
                    amount_cents,
                    currency,
                    created_at: now,
                    updated_at: now,
                };

                db.events.push(EventRecord::new(
                    "checkout.requested",
                    Some(&reading.id),
                    Some(&order.id),
                    json!({
                        "idempotency_key": order.idempotency_key,
                        "from_reading_id": true,
                    }),
                ));
                db.orders.push(order.clone());

                Ok(CheckoutUpsert {
                    reading,
                    order,
                    reused: false,
                })
            })
            .await
    }

    /// Attach the external payment-session id to an order
    ///
    /// First write wins: a second attachment attempt for the same order
    /// keeps the original session id, which guards against near-simultaneous
    /// session-creation calls racing each other.
    pub async fn attach_session(&self, order_id: &str, session_id: &str) -> Result<()> {
        let order_id = order_id.to_string();
        let session_id = session_id.to_string();

        self.store
            .mutate(move |db| {
                let order = db
                    .order_mut(&order_id)
                    .ok_or_else(|| Error::OrderNotFound(order_id.clone()))?;

                if order.stripe_session_id.is_none() {
                    order.stripe_session_id = Some(session_id);
                }
                order.updated_at = Utc::now();

                let event = EventRecord::new(
                    "checkout.session.created",
                    Some(&order.reading_request_id),
                    Some(&order.id),
                    json!({ "stripe_session_id": order.stripe_session_id }),
                );
                db.events.push(event);
                Ok(())
            })
            .await
    }
}

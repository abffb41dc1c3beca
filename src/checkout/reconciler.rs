//! Webhook reconciliation: pending → paid, exactly once
//!
//! The payment provider delivers completion events at least once, in any
//! order, and may replay them arbitrarily. Reconciliation is split into two
//! explicit stages joined by a durable marker:
//!
//! ```text
//! webhook ──▶ stage 1 (one store mutation)          stage 2 (one mutation)
//!             dedupe event id                        generate full content
//!             order: pending → paid          ──▶     attach it, clear the
//!             reading: mark content pending          pending marker
//! ```
//!
//! Stage 1 records the event id as processed before anything else, so a
//! replay is a no-op even if a crash interrupted the rest: every later
//! step is idempotent or checked. Stage 2 runs the generation collaborator
//! outside the store gate; a crash or generation failure between the stages
//! leaves the marker set, and [`WebhookReconciler::resume_pending_content`]
//! completes the work on the next startup. Readers never observe a broken
//! unlock state: full content is only exposed once it exists *and* the
//! order is paid.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::error::{Error, ProviderError, Result, StoreError};
use crate::reading::{ContentGenerator, ReadingInput};
use crate::store::{EventRecord, OrderStatus, PaywallStore, ReadingMode};

/// Outcome of applying one webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOutcome {
    /// The event id had already been applied; nothing changed
    pub already_processed: bool,
    /// An order was transitioned to paid by this delivery
    pub updated: bool,
}

enum PaidTransition {
    AlreadyProcessed,
    SessionNotFound,
    Applied {
        reading_id: String,
        needs_content: bool,
    },
}

/// Applies payment-confirmation events to the order state machine
#[derive(Clone)]
pub struct WebhookReconciler {
    store: Arc<PaywallStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl WebhookReconciler {
    /// Create a reconciler over the given store and content collaborator
    pub fn new(store: Arc<PaywallStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    /// Apply a `checkout.session.completed` delivery
    ///
    /// Replays return `already_processed` and change nothing. A session id
    /// that matches no order is recoverable (the webhook may have raced
    /// ahead of session attachment), so it is logged and acknowledged with
    /// `updated = false` rather than failed.
    pub async fn apply_session_completed(
        &self,
        webhook_event_id: &str,
        session_id: &str,
        payment_intent_id: Option<String>,
    ) -> Result<WebhookOutcome> {
        let event_id = webhook_event_id.to_string();
        let session = session_id.to_string();

        let transition = self
            .store
            .mutate(move |db| {
                if db.is_webhook_processed(&event_id) {
                    return Ok(PaidTransition::AlreadyProcessed);
                }
                // Recorded before any other mutation: a crash later in this
                // unit rolls the whole mutation back, and a crash after the
                // persist leaves only idempotent work outstanding.
                db.processed_webhook_events.push(event_id.clone());

                let position = db
                    .orders
                    .iter()
                    .position(|o| o.stripe_session_id.as_deref() == Some(session.as_str()));
                let Some(position) = position else {
                    db.events.push(EventRecord::new(
                        "webhook.session.not_found",
                        None,
                        None,
                        json!({
                            "stripe_session_id": session,
                            "webhook_event_id": event_id,
                        }),
                    ));
                    return Ok(PaidTransition::SessionNotFound);
                };

                let now = Utc::now();
                let order = &mut db.orders[position];
                order.status = OrderStatus::Paid;
                order.stripe_payment_intent_id = payment_intent_id;
                order.updated_at = now;
                let order_id = order.id.clone();
                let reading_id = order.reading_request_id.clone();

                let reading = db.reading_mut(&reading_id).ok_or_else(|| {
                    StoreError::Corrupt("order exists without reading request".to_string())
                })?;
                let needs_content = reading.full_result.is_none();
                if needs_content {
                    reading.full_content_pending = true;
                }
                reading.mode = ReadingMode::Full;
                reading.updated_at = now;

                db.events.push(EventRecord::new(
                    "webhook.checkout.completed",
                    Some(&reading_id),
                    Some(&order_id),
                    json!({
                        "stripe_session_id": session,
                        "webhook_event_id": event_id,
                    }),
                ));

                Ok(PaidTransition::Applied {
                    reading_id,
                    needs_content,
                })
            })
            .await?;

        match transition {
            PaidTransition::AlreadyProcessed => {
                tracing::info!(event_id = %webhook_event_id, "Webhook replay ignored");
                Ok(WebhookOutcome {
                    already_processed: true,
                    updated: false,
                })
            }
            PaidTransition::SessionNotFound => {
                tracing::warn!(
                    event_id = %webhook_event_id,
                    session_id = %session_id,
                    "Webhook session matched no order"
                );
                Ok(WebhookOutcome {
                    already_processed: false,
                    updated: false,
                })
            }
            PaidTransition::Applied {
                reading_id,
                needs_content,
            } => {
                if needs_content {
                    self.materialize_full_content(&reading_id).await?;
                }
                tracing::info!(
                    event_id = %webhook_event_id,
                    reading_id = %reading_id,
                    "Order marked paid"
                );
                Ok(WebhookOutcome {
                    already_processed: false,
                    updated: true,
                })
            }
        }
    }

    /// Generate and attach full content for a paid reading (stage 2)
    ///
    /// Only acts on readings carrying the pending marker, which stage 1
    /// sets exclusively under a paid transition, so content can never
    /// attach ahead of payment. Idempotent: without the marker this is a no-op.
    /// Generation runs outside the store gate.
    pub async fn materialize_full_content(&self, reading_id: &str) -> Result<()> {
        let snapshot = self.store.snapshot().await?;
        let reading = snapshot
            .reading(reading_id)
            .ok_or_else(|| Error::ReadingNotFound(reading_id.to_string()))?;

        if !reading.full_content_pending {
            return Ok(());
        }

        let generated = if reading.full_result.is_none() {
            let input = ReadingInput {
                person_a: reading.person_a.clone(),
                person_b: reading.person_b.clone(),
            };
            Some(
                self.generator
                    .full(&input)
                    .map_err(|e| ProviderError::ContentGeneration(e.to_string()))?,
            )
        } else {
            None
        };

        let reading_id = reading_id.to_string();
        self.store
            .mutate(move |db| {
                let reading = db
                    .reading_mut(&reading_id)
                    .ok_or_else(|| Error::ReadingNotFound(reading_id.clone()))?;

                if !reading.full_content_pending {
                    // Lost a race with a concurrent stage 2; nothing to do.
                    return Ok(());
                }

                let attached = reading.full_result.is_none() && generated.is_some();
                if reading.full_result.is_none() {
                    reading.full_result = generated;
                }
                reading.full_content_pending = false;
                reading.updated_at = Utc::now();

                if attached {
                    db.events.push(EventRecord::new(
                        "content.materialized",
                        Some(&reading_id),
                        None,
                        json!({}),
                    ));
                }
                Ok(())
            })
            .await
    }

    /// Recovery sweep for readings stuck between the two stages
    ///
    /// Finds paid orders whose reading still carries the pending marker and
    /// re-runs stage 2 for each. Returns the number of readings completed.
    /// Intended to run at startup; failures are logged per reading so one
    /// stuck record cannot block the rest.
    pub async fn resume_pending_content(&self) -> Result<u32> {
        let snapshot = self.store.snapshot().await?;
        let pending: Vec<String> = snapshot
            .reading_requests
            .iter()
            .filter(|r| r.full_content_pending)
            .filter(|r| {
                snapshot
                    .orders
                    .iter()
                    .any(|o| o.reading_request_id == r.id && o.status.is_paid())
            })
            .map(|r| r.id.clone())
            .collect();

        let mut completed = 0u32;
        for reading_id in &pending {
            match self.materialize_full_content(reading_id).await {
                Ok(()) => completed += 1,
                Err(e) => {
                    tracing::error!(
                        reading_id = %reading_id,
                        error = %e,
                        "Pending content recovery failed"
                    );
                }
            }
        }
        Ok(completed)
    }
}

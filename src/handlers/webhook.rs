//! Stripe webhook endpoint
//!
//! The handler consumes the raw body: signature verification runs over the
//! exact bytes Stripe signed, before any JSON parsing. Replays acknowledge
//! successfully, unhandled event types are audited and acknowledged, and
//! processing failures return 500 so the provider redelivers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use http::HeaderMap;
use serde::Serialize;
use serde_json::json;

use super::AppState;
use crate::error::{Error, Result, WebhookError};
use crate::stripe::{StripeEvent, StripeEventType};

/// Acknowledgement body returned to the provider
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `POST /webhook/stripe` - verify, deduplicate, and reconcile one delivery
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;
    state.verifier.verify(&body, signature)?;

    let event = StripeEvent::from_bytes(&body)?;

    match event.typed_event_type() {
        StripeEventType::CheckoutSessionCompleted => {
            let session_event = event.as_checkout_session()?;
            let payment_intent_id = session_event.session.payment_intent_id();

            match state
                .reconciler
                .apply_session_completed(&event.id, &session_event.session.id, payment_intent_id)
                .await
            {
                Ok(outcome) => {
                    if outcome.already_processed {
                        state.metrics.record_webhook_replayed();
                    } else if outcome.updated {
                        state.metrics.record_webhook_processed();
                    }
                    Ok(Json(WebhookAck { received: true }))
                }
                Err(err) => {
                    state.metrics.record_webhook_failure();
                    audit_failure(&state, &event.id, &err).await;
                    Err(err)
                }
            }
        }
        StripeEventType::Unknown => {
            state.metrics.record_webhook_ignored();
            state
                .readings
                .record_event(
                    "webhook.ignored",
                    None,
                    None,
                    json!({
                        "event_id": event.id,
                        "event_type": event.event_type,
                    }),
                )
                .await?;
            Ok(Json(WebhookAck { received: true }))
        }
    }
}

async fn audit_failure(state: &AppState, event_id: &str, err: &Error) {
    let audit = state
        .readings
        .record_event(
            "webhook.failed",
            None,
            None,
            json!({
                "event_id": event_id,
                "message": err.to_string(),
            }),
        )
        .await;
    if let Err(audit_err) = audit {
        tracing::error!(
            event_id = %event_id,
            error = %audit_err,
            "Failed to audit webhook failure"
        );
    }
}

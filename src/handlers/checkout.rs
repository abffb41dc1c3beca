//! Checkout creation endpoint
//!
//! Two intentionally separate paths: a checkout from raw person data
//! creates (or reuses) the reading+order pair, while a checkout for an
//! existing reading id only ever creates an order; an unknown reading id
//! is a 404, never an implicit creation.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::checkout::checkout_idempotency_key;
use crate::error::{Result, ValidationError};
use crate::reading::{validate, RawReadingInput};
use crate::stripe::CheckoutSessionRequest;

/// Body of `POST /api/checkout`
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Checkout against an already-created reading
    #[serde(default)]
    pub reading_request_id: Option<String>,
    /// Checkout from raw person data
    #[serde(default)]
    pub data: Option<RawReadingInput>,
}

/// Response of `POST /api/checkout`
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Payment-session id to redirect into; absent when already paid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub reading_id: String,
    pub already_paid: bool,
}

/// `POST /api/checkout` - create or reuse an order, then ensure it has a
/// payment session
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let amount_cents = state.config.price_cents;
    let currency = state.config.currency.clone();

    let upsert = match body.reading_request_id {
        Some(reading_id) => {
            state
                .orders
                .create_or_reuse_order_for_existing_reading(&reading_id, amount_cents, &currency)
                .await?
        }
        None => {
            let raw = body.data.ok_or_else(|| {
                ValidationError::InvalidBody(
                    "either reading_request_id or data is required".to_string(),
                )
            })?;
            let input = validate(raw)?;
            let key = checkout_idempotency_key(&input, amount_cents, &currency);
            state
                .orders
                .create_or_reuse_full_order(input, key, amount_cents, &currency)
                .await?
        }
    };
    state.metrics.record_checkout(upsert.reused);

    // Paid and unlocked: shortcut straight back to the reading.
    if upsert.order.status.is_paid() && upsert.reading.full_result.is_some() {
        return Ok(Json(CheckoutResponse {
            session_id: None,
            reading_id: upsert.reading.id,
            already_paid: true,
        }));
    }

    // A session already exists for this order; never open a second one.
    if let Some(session_id) = upsert.order.stripe_session_id.clone() {
        return Ok(Json(CheckoutResponse {
            session_id: Some(session_id),
            reading_id: upsert.reading.id,
            already_paid: false,
        }));
    }

    // Provider call happens outside the store's write gate; only the
    // resulting session id goes through a mutation.
    let session = state
        .payments
        .create_checkout_session(&CheckoutSessionRequest {
            amount_cents,
            currency,
            product_name: state.config.product_name.clone(),
            reading_id: upsert.reading.id.clone(),
            order_id: upsert.order.id.clone(),
            idempotency_key: upsert.order.idempotency_key.clone(),
            success_url: state.config.success_url(&upsert.reading.id),
            cancel_url: state.config.cancel_url(&upsert.reading.id),
        })
        .await?;

    state.orders.attach_session(&upsert.order.id, &session.id).await?;
    state.metrics.record_session_created();

    Ok(Json(CheckoutResponse {
        session_id: Some(session.id),
        reading_id: upsert.reading.id,
        already_paid: false,
    }))
}

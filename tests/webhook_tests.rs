//! Webhook endpoint tests: signature gate and reconciliation behavior
//!
//! Driven through the real router with `tower::ServiceExt::oneshot`, with
//! signatures computed the way Stripe computes them.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use soulcross_paywall::store::OrderStatus;
use support::*;

fn completed_event(event_id: &str, session_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": 1700000000,
        "livemode": false,
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": "pi_test_1",
                "payment_status": "paid"
            }
        }
    }))
    .expect("event serializes")
}

fn webhook_request(payload: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("content-type", "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .expect("request builds")
}

/// Create an order with an attached session, returning (reading_id, order_id)
async fn order_with_session(
    state: &std::sync::Arc<soulcross_paywall::handlers::AppState>,
    session_id: &str,
) -> (String, String) {
    use soulcross_paywall::checkout::checkout_idempotency_key;
    use soulcross_paywall::reading::validate;

    let input = validate(raw_input()).unwrap();
    let key = checkout_idempotency_key(&input, 999, "usd");
    let upsert = state
        .orders
        .create_or_reuse_full_order(input, key, 999, "usd")
        .await
        .unwrap();
    state
        .orders
        .attach_session(&upsert.order.id, session_id)
        .await
        .unwrap();
    (upsert.reading.id, upsert.order.id)
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let (state, _payments, _store) = build_state();
    let payload = completed_event("evt_1", "cs_1");

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("content-type", "application/json")
        // No stripe-signature header!
        .body(Body::from(payload))
        .unwrap();

    let (status, body) = send(state, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "webhook_rejected");
}

#[tokio::test]
async fn test_invalid_signature_rejected() {
    let (state, _payments, store) = build_state();
    let payload = completed_event("evt_1", "cs_1");
    let signature = stripe_signature(&payload, "wrong_secret", chrono::Utc::now().timestamp());

    let (status, _body) = send(state, webhook_request(payload, &signature)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was recorded: the payload was never trusted.
    let snapshot = store.snapshot().await.unwrap();
    assert!(snapshot.processed_webhook_events.is_empty());
    assert!(snapshot.events.is_empty());
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let (state, _payments, _store) = build_state();
    let payload = completed_event("evt_1", "cs_1");
    // 10 minutes old - outside the 5-minute tolerance
    let signature = stripe_signature(
        &payload,
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp() - 600,
    );

    let (status, _body) = send(state, webhook_request(payload, &signature)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_completed_session_marks_order_paid_exactly_once() {
    let (state, _payments, store) = build_state();
    let (reading_id, order_id) = order_with_session(&state, "cs_hook_1").await;

    let payload = completed_event("evt_hook_1", "cs_hook_1");

    let (status, body) = send(
        state.clone(),
        webhook_request(payload.clone(), &signed_header(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    // Replay of the same delivery acknowledges without reapplying.
    let (status, body) = send(
        state.clone(),
        webhook_request(payload.clone(), &signed_header(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let snapshot = store.snapshot().await.unwrap();
    let order = snapshot.order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.stripe_payment_intent_id.as_deref(), Some("pi_test_1"));

    let paid_events = snapshot
        .events
        .iter()
        .filter(|e| e.event_type == "webhook.checkout.completed")
        .count();
    assert_eq!(paid_events, 1);

    // And the unlock is visible through the read surface.
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/reading/{reading_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_full_unlocked"], true);
    assert!(body["reading"]["full_result"].is_object());
}

#[tokio::test]
async fn test_unhandled_event_type_is_audited_and_acknowledged() {
    let (state, _payments, store) = build_state();

    let payload = serde_json::to_vec(&json!({
        "id": "evt_other",
        "type": "invoice.payment_succeeded",
        "data": { "object": {} }
    }))
    .unwrap();

    let (status, body) = send(
        state,
        webhook_request(payload.clone(), &signed_header(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let snapshot = store.snapshot().await.unwrap();
    let ignored = snapshot
        .events
        .iter()
        .find(|e| e.event_type == "webhook.ignored")
        .expect("ignored event recorded");
    assert_eq!(ignored.payload["event_id"], "evt_other");
    assert_eq!(ignored.payload["event_type"], "invoice.payment_succeeded");
}

#[tokio::test]
async fn test_unknown_session_acknowledged_and_consumed() {
    let (state, _payments, store) = build_state();

    let payload = completed_event("evt_nosess", "cs_never_attached");
    let (status, body) = send(
        state.clone(),
        webhook_request(payload.clone(), &signed_header(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let snapshot = store.snapshot().await.unwrap();
    assert!(snapshot.is_webhook_processed("evt_nosess"));
    assert!(snapshot
        .events
        .iter()
        .any(|e| e.event_type == "webhook.session.not_found"));
}

#[tokio::test]
async fn test_malformed_event_body_rejected() {
    let (state, _payments, _store) = build_state();

    let payload = b"not json at all".to_vec();
    let (status, body) = send(
        state,
        webhook_request(payload.clone(), &signed_header(&payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "webhook_rejected");
}

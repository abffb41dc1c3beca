//! Preview creation and gated reading fetch

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::error::{Error, Result};
use crate::reading::{validate, FullReading, PreviewReading, RawReadingInput};
use crate::store::{OrderRecord, OrderStatus, ReadingMode};

/// Body of `POST /api/preview`
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Raw two-person input
    #[serde(default)]
    pub data: RawReadingInput,
}

/// Response of `POST /api/preview`
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub reading_id: String,
    pub mode: ReadingMode,
    pub preview_result: Option<PreviewReading>,
}

/// `POST /api/preview` - create a preview reading from raw input
pub async fn create_preview(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>> {
    let input = match validate(body.data) {
        Ok(input) => input,
        Err(err) => {
            // Rejections never mutate record state, but they do get audited.
            if let Err(audit_err) = state
                .readings
                .record_event(
                    "preview.request_failed",
                    None,
                    None,
                    json!({ "message": err.to_string() }),
                )
                .await
            {
                tracing::warn!(error = %audit_err, "Failed to audit rejected preview");
            }
            return Err(err.into());
        }
    };

    let reading = state.readings.create_preview(input).await?;
    state.metrics.record_preview();

    Ok(Json(PreviewResponse {
        reading_id: reading.id,
        mode: reading.mode,
        preview_result: reading.preview_result,
    }))
}

/// Reading fields exposed over the API
#[derive(Debug, Serialize)]
pub struct ReadingBody {
    pub id: String,
    pub mode: ReadingMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub preview_result: Option<PreviewReading>,
    /// Present only when the unlock gate is open
    pub full_result: Option<FullReading>,
}

/// Order fields exposed over the API
#[derive(Debug, Serialize)]
pub struct OrderBody {
    pub id: String,
    pub status: OrderStatus,
    pub amount_cents: i64,
    pub currency: String,
}

impl From<OrderRecord> for OrderBody {
    fn from(order: OrderRecord) -> Self {
        Self {
            id: order.id,
            status: order.status,
            amount_cents: order.amount_cents,
            currency: order.currency,
        }
    }
}

/// Response of `GET /api/reading/{id}`
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub reading: ReadingBody,
    pub order: Option<OrderBody>,
    pub is_full_unlocked: bool,
}

/// `GET /api/reading/{id}` - fetch a reading with the unlock gate applied
pub async fn fetch_reading(
    State(state): State<Arc<AppState>>,
    Path(reading_id): Path<String>,
) -> Result<Json<ReadingResponse>> {
    if reading_id.trim().is_empty() {
        return Err(Error::ReadingNotFound(reading_id));
    }

    let view = state.readings.fetch(&reading_id).await?;
    Ok(Json(ReadingResponse {
        reading: ReadingBody {
            id: view.reading.id,
            mode: view.reading.mode,
            created_at: view.reading.created_at,
            updated_at: view.reading.updated_at,
            preview_result: view.reading.preview_result,
            full_result: view.reading.full_result,
        },
        order: view.order.map(OrderBody::from),
        is_full_unlocked: view.is_full_unlocked,
    }))
}

//! Reading request manager
//!
//! Creates preview readings, looks records back up, and applies the unlock
//! gate when a reading is fetched: full content is exposed only when the
//! associated order is paid and the content actually exists.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, ProviderError, Result};
use crate::reading::{ContentGenerator, ReadingInput};
use crate::store::{
    EventRecord, OrderRecord, PaywallStore, ReadingMode, ReadingRequestRecord,
};

/// A fetched reading together with its order and the computed unlock flag
#[derive(Debug, Clone)]
pub struct ReadingView {
    /// The reading record; `full_result` is already gated
    pub reading: ReadingRequestRecord,
    /// The reading's order, if one exists
    pub order: Option<OrderRecord>,
    /// Whether the full content is unlocked for this reading
    pub is_full_unlocked: bool,
}

/// Manager for reading request creation and lookup
#[derive(Clone)]
pub struct ReadingManager {
    store: Arc<PaywallStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl ReadingManager {
    /// Create a manager over the given store and content collaborator
    pub fn new(store: Arc<PaywallStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    /// Create a preview reading from validated input
    ///
    /// Preview content is rendered before the store gate is taken, then the
    /// record and its `preview.requested` audit event are persisted in one
    /// mutation.
    pub async fn create_preview(&self, input: ReadingInput) -> Result<ReadingRequestRecord> {
        let preview = self
            .generator
            .preview(&input)
            .map_err(|e| ProviderError::ContentGeneration(e.to_string()))?;

        let created = self
            .store
            .mutate(move |db| {
                let now = Utc::now();
                let reading = ReadingRequestRecord {
                    id: Uuid::new_v4().to_string(),
                    mode: ReadingMode::Preview,
                    person_a: input.person_a,
                    person_b: input.person_b,
                    preview_result: Some(preview),
                    full_result: None,
                    full_content_pending: false,
                    created_at: now,
                    updated_at: now,
                };

                db.events.push(EventRecord::new(
                    "preview.requested",
                    Some(&reading.id),
                    None,
                    json!({ "mode": "preview" }),
                ));
                db.reading_requests.push(reading.clone());
                Ok(reading)
            })
            .await?;

        tracing::info!(reading_id = %created.id, "Preview reading created");
        Ok(created)
    }

    /// Look up a reading by id, or `None` if it does not exist
    pub async fn lookup(&self, reading_id: &str) -> Result<Option<ReadingRequestRecord>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.reading(reading_id).cloned())
    }

    /// Fetch a reading with its order, applying the unlock gate
    ///
    /// `full_result` is stripped from the returned record unless the order
    /// is paid and the content exists, so a pending order can never leak
    /// full content, even content generated ahead of the paid transition.
    pub async fn fetch(&self, reading_id: &str) -> Result<ReadingView> {
        let snapshot = self.store.snapshot().await?;
        let mut reading = snapshot
            .reading(reading_id)
            .cloned()
            .ok_or_else(|| Error::ReadingNotFound(reading_id.to_string()))?;
        let order = snapshot.order_for_reading(reading_id).cloned();

        let is_full_unlocked = order
            .as_ref()
            .map(|o| o.status.is_paid())
            .unwrap_or(false)
            && reading.full_result.is_some();
        if !is_full_unlocked {
            reading.full_result = None;
        }

        Ok(ReadingView {
            reading,
            order,
            is_full_unlocked,
        })
    }

    /// Append a standalone audit event
    ///
    /// Used by boundary handlers for conditions that change no record state
    /// (rejected previews, ignored or failed webhooks) but still belong in
    /// the audit trail.
    pub async fn record_event(
        &self,
        event_type: &str,
        reading_request_id: Option<&str>,
        order_id: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<()> {
        let event = EventRecord::new(event_type, reading_request_id, order_id, payload);
        self.store
            .mutate(move |db| {
                db.events.push(event);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::input::{validate, RawPersonInput, RawReadingInput};
    use crate::reading::TemplateGenerator;

    fn manager() -> ReadingManager {
        ReadingManager::new(
            Arc::new(PaywallStore::in_memory()),
            Arc::new(TemplateGenerator),
        )
    }

    fn sample_input() -> ReadingInput {
        validate(RawReadingInput {
            person_a: Some(RawPersonInput {
                name: Some("Alice".to_string()),
                birthday: Some("1990-01-01".to_string()),
                ..RawPersonInput::default()
            }),
            person_b: Some(RawPersonInput {
                name: Some("Bob".to_string()),
                birthday: Some("1992-02-02".to_string()),
                ..RawPersonInput::default()
            }),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_preview_populates_content_and_event() {
        let manager = manager();
        let reading = manager.create_preview(sample_input()).await.unwrap();

        assert_eq!(reading.mode, ReadingMode::Preview);
        assert!(reading.preview_result.is_some());
        assert!(reading.full_result.is_none());

        let view = manager.fetch(&reading.id).await.unwrap();
        assert!(!view.is_full_unlocked);
        assert!(view.order.is_none());
        assert!(view.reading.preview_result.is_some());
        assert!(view.reading.full_result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_unknown_reading_is_not_found() {
        let manager = manager();
        let err = manager.fetch("missing").await.unwrap_err();
        assert!(matches!(err, Error::ReadingNotFound(_)));
    }

    #[tokio::test]
    async fn test_lookup_returns_none_for_unknown_id() {
        let manager = manager();
        assert!(manager.lookup("missing").await.unwrap().is_none());
    }
}

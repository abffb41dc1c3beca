//! Durable store for the paywall state
//!
//! All persisted state (reading requests, orders, the audit log, and the
//! processed-webhook set) lives in one [`PaywallDb`] snapshot that is read
//! and written as a unit. Mutations across the whole system are serialized
//! through a single write gate so that concurrent requests can never
//! interleave partial reads and writes of the same state:
//!
//! ```text
//! caller ──▶ mutate(f) ──▶ [write gate] ──▶ load snapshot
//!                                │               │
//!                                │               ▼
//!                                │         f(&mut PaywallDb)
//!                                │               │
//!                                │               ▼
//!                                └──────── persist (atomic swap)
//! ```
//!
//! Each mutation unit sees a fully consistent prior state, and its result is
//! durable before the gate admits the next unit. If the mutation function or
//! the persist step fails, nothing is written: callers must treat a failed
//! mutation as "no state change occurred". Reads bypass the gate and observe
//! the latest committed snapshot (the backend swap is atomic, so a partially
//! written snapshot is never visible).
//!
//! Mutation functions must stay free of slow external I/O: provider calls
//! and content generation happen before or after the gated section, never
//! inside it.

pub mod backend;
pub mod records;

use tokio::sync::Mutex;

pub use backend::{JsonFileBackend, MemoryBackend, StateBackend};
pub use records::{
    EventRecord, OrderRecord, OrderStatus, PaywallDb, ReadingMode, ReadingRequestRecord,
};

use crate::error::{Result, StoreError};

/// Single-writer durable store over a pluggable [`StateBackend`]
pub struct PaywallStore {
    backend: Box<dyn StateBackend>,
    write_gate: Mutex<()>,
}

impl PaywallStore {
    /// Create a store over the given backend
    pub fn new(backend: impl StateBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            write_gate: Mutex::new(()),
        }
    }

    /// Create a store over an in-memory backend (tests, ephemeral runs)
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    async fn load_db(&self) -> std::result::Result<PaywallDb, StoreError> {
        match self.backend.load().await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(StoreError::Decode),
            None => Ok(PaywallDb::default()),
        }
    }

    /// Read the latest fully-committed snapshot
    pub async fn snapshot(&self) -> Result<PaywallDb> {
        Ok(self.load_db().await?)
    }

    /// Apply one serialized mutation unit
    ///
    /// Acquires the write gate, loads the current snapshot, applies `f`, and
    /// persists the result before releasing the gate. An `Err` from `f` (a
    /// rejected mutation) or from persistence leaves the durable state
    /// untouched.
    pub async fn mutate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PaywallDb) -> Result<T>,
    {
        let _gate = self.write_gate.lock().await;
        let mut db = self.load_db().await?;
        let out = f(&mut db)?;
        let bytes = serde_json::to_vec_pretty(&db).map_err(StoreError::Encode)?;
        self.backend.persist(bytes).await?;
        Ok(out)
    }
}

impl std::fmt::Debug for PaywallStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaywallStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mutate_persists_and_snapshot_reads_back() {
        let store = PaywallStore::in_memory();

        store
            .mutate(|db| {
                db.processed_webhook_events.push("evt_1".to_string());
                Ok(())
            })
            .await
            .unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.is_webhook_processed("evt_1"));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_untouched() {
        let store = PaywallStore::in_memory();

        store
            .mutate(|db| {
                db.processed_webhook_events.push("evt_keep".to_string());
                Ok(())
            })
            .await
            .unwrap();

        let result: Result<()> = store
            .mutate(|db| {
                db.processed_webhook_events.push("evt_discard".to_string());
                Err(Error::OrderNotFound("missing".to_string()))
            })
            .await;
        assert!(result.is_err());

        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.is_webhook_processed("evt_keep"));
        assert!(!snapshot.is_webhook_processed("evt_discard"));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_never_lose_updates() {
        let store = Arc::new(PaywallStore::in_memory());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(move |db| {
                        db.processed_webhook_events.push(format!("evt_{i}"));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.processed_webhook_events.len(), 16);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = PaywallStore::new(JsonFileBackend::new(dir.path()));
            store
                .mutate(|db| {
                    db.processed_webhook_events.push("evt_durable".to_string());
                    Ok(())
                })
                .await
                .unwrap();
        }

        let reopened = PaywallStore::new(JsonFileBackend::new(dir.path()));
        let snapshot = reopened.snapshot().await.unwrap();
        assert!(snapshot.is_webhook_processed("evt_durable"));
    }
}

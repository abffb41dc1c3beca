//! Pluggable persistence backends for the durable store
//!
//! The store itself only understands "load the latest snapshot bytes" and
//! "persist these snapshot bytes atomically"; everything else (the write
//! queue, encoding, record access) lives in [`PaywallStore`](super::PaywallStore).
//! Swapping the backend swaps the durability medium without touching any
//! business logic.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;

/// Name of the snapshot file inside the data directory
const SNAPSHOT_FILE: &str = "paywall-db.json";

/// Storage medium for the serialized snapshot
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Load the latest durable snapshot, or `None` if nothing was persisted yet
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Durably persist a snapshot; on return the bytes are the new committed
    /// state. Must be atomic: a crash mid-persist leaves the previous
    /// snapshot readable, never a partial one.
    async fn persist(&self, bytes: Vec<u8>) -> Result<(), StoreError>;
}

/// JSON-file backend: one snapshot file, swapped atomically via tmp + rename
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend persisting to `<data_dir>/paywall-db.json`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn persist(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write the whole snapshot to a sibling tmp file, then rename over
        // the live one. rename(2) within a directory is atomic, so readers
        // observe either the old snapshot or the new one.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryBackend {
    cell: RwLock<Option<Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.cell.read().clone())
    }

    async fn persist(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        *self.cell.write() = Some(bytes);
        Ok(())
    }
}

//! Persisted subscription state
//!
//! The listener records which keys it tracks and the remote ids assigned to
//! them, so that a restarted process can clean up remote subscriptions it no
//! longer wants even when its public address changed in between.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// One tracked subscription as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSubscription {
    pub key: String,
    pub remote_id: Option<String>,
    pub event_type: String,
    pub params: Value,
}

/// Storage for persisted subscription state. Entries are kept in order.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn load(&self) -> Result<Vec<PersistedSubscription>, StoreError>;
    async fn save(&self, entries: &[PersistedSubscription]) -> Result<(), StoreError>;
}

/// Process-local store; state is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<PersistedSubscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<PersistedSubscription>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn snapshot(&self) -> Vec<PersistedSubscription> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn load(&self) -> Result<Vec<PersistedSubscription>, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, entries: &[PersistedSubscription]) -> Result<(), StoreError> {
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }
}

/// Store backed by a JSON file. A missing file loads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<PersistedSubscription>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &[PersistedSubscription]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries)?;
        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.temp_path();
        if let Err(e) = tokio::fs::write(&tmp, json).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

impl JsonFileStore {
    /// Sibling temp file, unique per save so concurrent writers never share one.
    fn temp_path(&self) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "subscriptions".to_string());
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }
}

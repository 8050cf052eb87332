use std::{future::Future, path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sled::Db;
use tokio::sync::Mutex;

use super::{ResponseStore, StoreError};

/// Envelope written to disk for every entry. `created_at` records when the
/// value was produced; lookups never consult it and entries never expire.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    created_at: DateTime<Utc>,
}

/// Response store backed by a sled database on disk.
///
/// sled holds an exclusive lock on its directory, so the handle is opened
/// once and lives for the process. Every insert is flushed to disk before
/// the value is returned, which keeps entries durable across restarts
/// without closing the database between requests.
pub struct SledResponseStore {
    db: Db,
    // One gate per key with a computation in flight, so concurrent misses
    // on the same key wait for the first caller instead of racing the
    // producer.
    inflight: DashMap<Vec<u8>, Arc<Mutex<()>>>,
}

impl SledResponseStore {
    /// Opens the store at `path`, creating the database if it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self {
            db,
            inflight: DashMap::new(),
        })
    }

    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        let entry: StoredEntry<T> = serde_json::from_slice(&raw)?;
        Ok(Some(entry.value))
    }

    async fn persist<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), StoreError> {
        let entry = StoredEntry {
            value,
            created_at: Utc::now(),
        };
        self.db.insert(key, serde_json::to_vec(&entry)?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    fn release_gate(&self, key: &[u8], gate: &Arc<Mutex<()>>) {
        // Two references left means the map and this caller; nobody else is
        // waiting on the key.
        if Arc::strong_count(gate) <= 2 {
            self.inflight.remove(key);
        }
    }
}

impl ResponseStore for SledResponseStore {
    async fn get_or_compute<T, E, F, Fut>(&self, key: &[u8], compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: From<StoreError> + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        if let Some(value) = self.read(key).map_err(E::from)? {
            tracing::debug!(key_len = key.len(), "serving stored response");
            return Ok(value);
        }

        let gate = Arc::clone(self.inflight.entry(key.to_vec()).or_default().value());
        let outcome = {
            let _guard = gate.lock().await;
            // Another request may have stored the value while we waited.
            match self.read(key) {
                Ok(Some(value)) => Ok(value),
                Ok(None) => {
                    tracing::debug!(key_len = key.len(), "no stored response, invoking producer");
                    match compute().await {
                        Ok(value) => self
                            .persist(key, &value)
                            .await
                            .map_err(E::from)
                            .map(|()| value),
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(E::from(e)),
            }
        };
        self.release_gate(key, &gate);
        outcome
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(key)?)
    }
}

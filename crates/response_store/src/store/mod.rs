use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};

pub mod sled;

/// Failures of the store itself, as opposed to failures of the producer
/// being memoized. Producer errors pass through [`ResponseStore::get_or_compute`]
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store database error: {0}")]
    Database(#[from] ::sled::Error),

    #[error("store codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Write-once memoization of expensive lookups.
pub trait ResponseStore {
    /// Returns the value stored under `key`, or invokes `compute`, persists
    /// its result under `key` and returns it.
    ///
    /// A failed `compute` leaves no trace in the store; its error is
    /// returned to the caller unmodified, and the next call for the same
    /// key will invoke the producer again.
    fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &[u8],
        compute: F,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: From<StoreError> + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;

    /// Whether an entry exists under `key`, without invoking any producer.
    fn contains(&self, key: &[u8]) -> Result<bool, StoreError>;
}

impl<S: ResponseStore + Send + Sync> ResponseStore for &S {
    async fn get_or_compute<T, E, F, Fut>(&self, key: &[u8], compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: From<StoreError> + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        (**self).get_or_compute(key, compute).await
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        (**self).contains(key)
    }
}

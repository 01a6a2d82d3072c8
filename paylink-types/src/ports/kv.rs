//! Ephemeral key/value store port.
//!
//! Backs the idempotency records and webhook dedup markers. The only
//! at-most-once structures in the system, so the write primitive is an
//! atomic set-if-absent rather than a separate check and write.

use std::time::Duration;

use crate::error::RepoError;

#[async_trait::async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Reads a live (unexpired) value.
    async fn get(&self, key: &str) -> Result<Option<String>, RepoError>;

    /// Stores `value` under `key` only if the key is absent.
    ///
    /// Returns `true` when this call claimed the key, `false` when a live
    /// value was already present. The claim is atomic against concurrent
    /// callers of the same key.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, RepoError>;

    /// Removes a key, live or expired.
    async fn delete(&self, key: &str) -> Result<(), RepoError>;
}

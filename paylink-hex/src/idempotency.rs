//! Idempotency gate for payment initiation.
//!
//! Each initiation request carries a client-chosen `Idempotency-Key`. The
//! gate claims the key atomically before any work happens, so two requests
//! carrying the same key can never both reach the provider: one does the
//! work, the other replays the stored response or is told to back off.

use std::sync::Arc;
use std::time::Duration;

use paylink_types::{AppError, InitiatePaymentResponse, KvStore};

/// How long a completed initiation outcome is replayable.
const RECORD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long an in-flight claim blocks concurrent carriers of the same key.
/// Comfortably longer than the provider call timeout.
const CLAIM_TTL: Duration = Duration::from_secs(120);

/// Marker value stored while the initiation is still running.
const IN_FLIGHT: &str = "__in_flight__";

/// Result of checking a key before starting work.
pub enum IdempotencyCheck {
    /// This caller claimed the key and must do the work.
    Claimed,
    /// A previous request with this key already completed.
    Replay(InitiatePaymentResponse),
    /// Another request with this key is running right now.
    InFlight,
}

/// At-most-once gate over the ephemeral key/value store.
#[derive(Clone)]
pub struct IdempotencyGate {
    kv: Arc<dyn KvStore>,
}

impl IdempotencyGate {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(idempotency_key: &str) -> String {
        format!("idem:payment:{}", idempotency_key)
    }

    /// Claims the key or reports what is already stored under it.
    ///
    /// A stored record that no longer deserializes is treated as a miss:
    /// the request proceeds rather than being rejected over a stale entry.
    pub async fn begin(&self, idempotency_key: &str) -> Result<IdempotencyCheck, AppError> {
        let key = Self::key(idempotency_key);

        let claimed = self
            .kv
            .set_if_absent(&key, IN_FLIGHT, CLAIM_TTL)
            .await
            .map_err(AppError::from)?;
        if claimed {
            return Ok(IdempotencyCheck::Claimed);
        }

        match self.kv.get(&key).await.map_err(AppError::from)? {
            Some(value) if value == IN_FLIGHT => Ok(IdempotencyCheck::InFlight),
            Some(value) => match serde_json::from_str::<InitiatePaymentResponse>(&value) {
                Ok(response) => Ok(IdempotencyCheck::Replay(response)),
                Err(e) => {
                    tracing::warn!(
                        "Unreadable idempotency record for key {}, proceeding: {}",
                        idempotency_key,
                        e
                    );
                    Ok(IdempotencyCheck::Claimed)
                }
            },
            // Claim expired between the two calls; rare, treat as ours.
            None => Ok(IdempotencyCheck::Claimed),
        }
    }

    /// Replaces the in-flight marker with the final outcome.
    ///
    /// Storage errors are logged, not surfaced: the payment already went
    /// through and the client must still receive its response.
    pub async fn complete(&self, idempotency_key: &str, response: &InitiatePaymentResponse) {
        let key = Self::key(idempotency_key);
        let value = match serde_json::to_string(response) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Failed to serialize idempotency record: {}", e);
                return;
            }
        };

        // We hold the claim, so delete-then-set is not racing anyone.
        if let Err(e) = self.kv.delete(&key).await {
            tracing::warn!("Failed to clear idempotency claim {}: {}", idempotency_key, e);
        }
        if let Err(e) = self.kv.set_if_absent(&key, &value, RECORD_TTL).await {
            tracing::warn!("Failed to store idempotency record {}: {}", idempotency_key, e);
        }
    }

    /// Drops the claim so the client may retry with the same key.
    pub async fn release(&self, idempotency_key: &str) {
        let key = Self::key(idempotency_key);
        if let Err(e) = self.kv.delete(&key).await {
            tracing::warn!(
                "Failed to release idempotency claim {}: {}",
                idempotency_key,
                e
            );
        }
    }
}

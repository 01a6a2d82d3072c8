//! Provider webhook reconciliation.
//!
//! The provider pushes status changes to us; this service authenticates the
//! delivery, deduplicates it, applies the transition through the guarded
//! repository update and fires terminal effects when the transition landed.

use std::sync::Arc;
use std::time::Duration;

use paylink_repo::security::verify_webhook_signature;
use paylink_types::{
    AppError, KvStore, PaymentRepository, PaymentStatus, WebhookAck, WebhookPayload,
};

use crate::effects::EffectsOrchestrator;

/// How long a processed-delivery marker lives. Providers retry for days,
/// not weeks.
const DEDUP_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct WebhookService<R: PaymentRepository> {
    repo: Arc<R>,
    kv: Arc<dyn KvStore>,
    effects: EffectsOrchestrator<R>,
    /// Shared secret for HMAC verification; absent only outside production.
    secret: Option<String>,
}

impl<R: PaymentRepository> WebhookService<R> {
    pub fn new(
        repo: Arc<R>,
        kv: Arc<dyn KvStore>,
        effects: EffectsOrchestrator<R>,
        secret: Option<String>,
    ) -> Self {
        if secret.is_none() {
            tracing::warn!("No webhook secret configured, deliveries are NOT authenticated");
        }
        Self {
            repo,
            kv,
            effects,
            secret,
        }
    }

    /// Handles one webhook delivery.
    ///
    /// The signature is computed over the exact request bytes, before any
    /// JSON parsing. Deliveries for unknown transactions are acknowledged
    /// and dropped so the provider stops retrying them.
    pub async fn handle(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, AppError> {
        if let Some(secret) = &self.secret {
            let signature = signature
                .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".into()))?;
            if !verify_webhook_signature(body, signature, secret) {
                return Err(AppError::Unauthorized("Invalid webhook signature".into()));
            }
        }

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {}", e)))?;
        // The whole delivery is kept as the last provider response, not just
        // its metadata field.
        let raw_delivery: Option<serde_json::Value> = serde_json::from_slice(body).ok();

        let mapped = PaymentStatus::from_provider(&payload.status);
        tracing::info!(
            "Webhook for provider transaction {}: {} -> {}",
            payload.transaction_id,
            payload.status,
            mapped
        );

        let tx = match self
            .repo
            .find_by_provider_tx_id(&payload.transaction_id)
            .await?
        {
            Some(tx) => tx,
            None => {
                tracing::warn!(
                    "Webhook for unknown provider transaction {}, acknowledging",
                    payload.transaction_id
                );
                return Ok(WebhookAck::ignored());
            }
        };

        // One marker per (delivery target, mapped status): a PROCESSING
        // notification must not shadow the later SUCCESS one. Finer-grained
        // than marking the transaction id alone, with the consequence that a
        // same-status replay carrying a different failure reason also counts
        // as a duplicate.
        let marker = format!("webhook:processed:{}:{}", payload.transaction_id, mapped);
        let claimed = self.kv.set_if_absent(&marker, "1", DEDUP_TTL).await?;
        if !claimed {
            tracing::info!(
                "Duplicate webhook delivery for {} ({}), skipping",
                payload.transaction_id,
                mapped
            );
            return Ok(WebhookAck::duplicate());
        }

        let failure_reason = (mapped == PaymentStatus::Failed).then(|| {
            payload
                .failure_reason
                .clone()
                .unwrap_or_else(|| "Payment failed at the provider".into())
        });

        let transition = match self
            .repo
            .apply_status(tx.id, mapped, failure_reason, raw_delivery)
            .await
        {
            Ok(transition) => transition,
            Err(e) => {
                // Give the retry a chance instead of swallowing the delivery.
                if let Err(del) = self.kv.delete(&marker).await {
                    tracing::warn!("Failed to roll back webhook marker {}: {}", marker, del);
                }
                return Err(e.into());
            }
        };

        if transition.was_applied() && transition.transaction().status.is_terminal() {
            self.effects.on_terminal(transition.transaction()).await;
        }

        Ok(WebhookAck::processed(transition.transaction().status))
    }
}

//! Payment application service.
//!
//! Orchestrates the transaction lifecycle through the repository and
//! provider ports. Contains no storage or HTTP mechanics.

use std::sync::Arc;

use chrono::Utc;

use paylink_types::{
    AppError, ExternalReference, InitiatePaymentRequest, InitiatePaymentResponse, KvStore,
    PaymentRepository, PhoneNumber, ProviderClient, ProviderInitiateRequest, Transaction,
    TransactionId, TransactionView,
};

use crate::effects::EffectsOrchestrator;
use crate::idempotency::{IdempotencyCheck, IdempotencyGate};

/// Application service for the payment lifecycle.
///
/// Generic over `R: PaymentRepository` - the adapter is injected at compile
/// time, which keeps the service testable against an in-memory double.
pub struct PaymentService<R: PaymentRepository> {
    repo: Arc<R>,
    provider: Arc<dyn ProviderClient>,
    gate: IdempotencyGate,
    effects: EffectsOrchestrator<R>,
}

impl<R: PaymentRepository> PaymentService<R> {
    pub fn new(
        repo: Arc<R>,
        provider: Arc<dyn ProviderClient>,
        kv: Arc<dyn KvStore>,
        effects: EffectsOrchestrator<R>,
    ) -> Self {
        Self {
            repo,
            provider,
            gate: IdempotencyGate::new(kv),
            effects,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Returns the provider gateway handle.
    pub fn provider(&self) -> &Arc<dyn ProviderClient> {
        &self.provider
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initiation
    // ─────────────────────────────────────────────────────────────────────────

    /// Initiates a payment, at most once per idempotency key.
    ///
    /// A replayed key returns the stored outcome without touching the
    /// provider. A key whose first request is still running is rejected
    /// with a conflict. A failed attempt releases the key so the client
    /// can retry with it.
    pub async fn initiate(
        &self,
        idempotency_key: &str,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, AppError> {
        if idempotency_key.trim().is_empty() {
            return Err(AppError::BadRequest("Idempotency-Key must not be empty".into()));
        }

        match self.gate.begin(idempotency_key).await? {
            IdempotencyCheck::Replay(response) => {
                tracing::info!(
                    "Replaying initiation for idempotency key {}",
                    idempotency_key
                );
                return Ok(response);
            }
            IdempotencyCheck::InFlight => {
                return Err(AppError::Conflict(
                    "A request with this Idempotency-Key is already in progress".into(),
                ));
            }
            IdempotencyCheck::Claimed => {}
        }

        let result = self.initiate_inner(req).await;
        match &result {
            Ok(response) => self.gate.complete(idempotency_key, response).await,
            Err(_) => self.gate.release(idempotency_key).await,
        }
        result
    }

    async fn initiate_inner(
        &self,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, AppError> {
        if req.customer_name.trim().is_empty() {
            return Err(AppError::BadRequest("Customer name cannot be empty".into()));
        }

        let link_ref = req.link_ref()?;
        let phone = PhoneNumber::normalize(&req.customer_phone)?;

        let link = self
            .repo
            .find_link(&link_ref)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment link not found".into()))?;
        link.validate(Utc::now())?;

        // The amount is fixed here, from the link as it stands right now.
        let tx = Transaction::initiate(
            &link,
            req.payment_provider,
            req.customer_name.trim().to_string(),
            phone,
            req.customer_email.clone(),
        );
        let tx = self.repo.create_transaction(tx).await?;

        let provider_req = ProviderInitiateRequest {
            amount: tx.amount,
            phone: tx.customer_phone.clone(),
            customer_name: tx.customer_name.clone(),
            customer_email: tx.customer_email.clone(),
            carrier: tx.carrier,
            reference: tx.reference.clone(),
        };

        match self.provider.initiate(provider_req).await {
            Ok(acceptance) => {
                let updated = self
                    .repo
                    .mark_processing(
                        tx.id,
                        &acceptance.provider_transaction_id,
                        Some(acceptance.raw),
                    )
                    .await?;
                tracing::info!(
                    "Payment {} accepted by provider as {}",
                    updated.reference,
                    acceptance.provider_transaction_id
                );
                Ok(InitiatePaymentResponse::from(&updated))
            }
            Err(e) => {
                tracing::warn!("Provider rejected payment {}: {}", tx.reference, e);
                if let Err(mark_err) = self.repo.mark_failed(tx.id, &e.to_string(), None).await {
                    tracing::error!(
                        "Failed to record provider rejection for {}: {}",
                        tx.reference,
                        mark_err
                    );
                }
                Err(e.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the current view of a transaction, reconciling against the
    /// provider when the stored status is not terminal.
    ///
    /// Reconciliation is best-effort: a provider outage degrades this to a
    /// plain read of the stored record.
    pub async fn query_status(&self, reference: &str) -> Result<TransactionView, AppError> {
        let reference = ExternalReference::from(reference.to_string());
        let tx = self
            .repo
            .find_by_reference(&reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction not found: {}", reference)))?;

        if tx.status.is_terminal() {
            return Ok(TransactionView::from(&tx));
        }

        let Some(provider_tx_id) = tx.provider_transaction_id.clone() else {
            return Ok(TransactionView::from(&tx));
        };

        let remote = match self.provider.check_status(&provider_tx_id).await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::warn!(
                    "Status check against provider failed for {}, serving stored state: {}",
                    tx.reference,
                    e
                );
                return Ok(TransactionView::from(&tx));
            }
        };

        if remote.status == tx.status || !tx.status.can_transition_to(remote.status) {
            return Ok(TransactionView::from(&tx));
        }

        let failure_reason = (remote.status == paylink_types::PaymentStatus::Failed)
            .then(|| {
                remote
                    .message
                    .clone()
                    .unwrap_or_else(|| "Payment failed at the provider".into())
            });

        let transition = self
            .repo
            .apply_status(tx.id, remote.status, failure_reason, Some(remote.raw))
            .await?;

        if transition.was_applied() && transition.transaction().status.is_terminal() {
            self.effects.on_terminal(transition.transaction()).await;
        }

        Ok(TransactionView::from(transition.transaction()))
    }

    /// Gets a transaction by internal id, without reconciliation.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<TransactionView, AppError> {
        self.repo
            .get_transaction(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| {
                opt.map(|tx| TransactionView::from(&tx))
                    .ok_or_else(|| AppError::NotFound(format!("Transaction {}", id)))
            })
    }
}

//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture: the system of
//! record for transactions, plus the read/accounting surface of payment
//! links the engine needs. Adapters (SQLite, in-memory test doubles)
//! implement this trait.

use crate::domain::{
    ExternalReference, PaymentLink, PaymentStatus, ProductId, Transaction, TransactionId,
};
use crate::dto::LinkRef;
use crate::error::RepoError;

/// Outcome of a guarded status transition.
#[derive(Debug, Clone)]
pub enum StatusTransition {
    /// The transition was applied; the returned record reflects it.
    Applied(Transaction),
    /// The transaction was already terminal; nothing was written.
    AlreadyTerminal(Transaction),
    /// The reported status equals the stored one; nothing was written.
    Unchanged(Transaction),
}

impl StatusTransition {
    /// The record after the operation, whichever branch was taken.
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Applied(tx) | Self::AlreadyTerminal(tx) | Self::Unchanged(tx) => tx,
        }
    }

    /// Whether a write actually happened.
    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// The main repository port for the transaction lifecycle.
///
/// Status transitions MUST be guarded against terminal states at the storage
/// layer: a concurrent webhook and poll race to apply the same transition,
/// and the loser has to land on a harmless no-op.
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────
    // Transactions
    // ─────────────────────────────────────────────────────────────────────────

    /// Persists a freshly initiated (Pending) transaction.
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError>;

    /// Gets a transaction by internal id.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    /// Finds a transaction by this system's external reference.
    async fn find_by_reference(
        &self,
        reference: &ExternalReference,
    ) -> Result<Option<Transaction>, RepoError>;

    /// Finds a transaction by the provider-assigned transaction id.
    async fn find_by_provider_tx_id(
        &self,
        provider_tx_id: &str,
    ) -> Result<Option<Transaction>, RepoError>;

    /// PENDING -> PROCESSING: records the provider's acceptance.
    ///
    /// Sets the write-once provider transaction id, stores the raw provider
    /// response, and increments the link usage counter - exactly once, in
    /// the same storage transaction.
    async fn mark_processing(
        &self,
        id: TransactionId,
        provider_tx_id: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError>;

    /// PENDING -> FAILED: the provider rejected the initiation.
    ///
    /// Captures the provider's message as the failure reason. Does not touch
    /// usage counters.
    async fn mark_failed(
        &self,
        id: TransactionId,
        reason: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError>;

    /// Applies a reconciled status (webhook or poll path).
    ///
    /// Single guarded update: a transaction already terminal, or already in
    /// the reported status, is returned untouched.
    async fn apply_status(
        &self,
        id: TransactionId,
        status: PaymentStatus,
        failure_reason: Option<String>,
        raw_response: Option<serde_json::Value>,
    ) -> Result<StatusTransition, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Links & stock (external aggregate, engine-facing slice)
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads a payment link by id or public slug.
    async fn find_link(&self, link: &LinkRef) -> Result<Option<PaymentLink>, RepoError>;

    /// Decrements finite stock by one.
    ///
    /// Returns `false` without writing when stock is already zero or the
    /// sentinel "unlimited" value; callers log the no-op.
    async fn decrement_stock(&self, product_id: ProductId) -> Result<bool, RepoError>;
}

//! # PayLink Repository
//!
//! Concrete storage adapters for the payment link service:
//! - `sqlite` (feature-gated) - the relational system of record for
//!   transactions and the engine-facing slice of payment links
//! - `kv` - in-memory TTL key/value store backing idempotency records and
//!   webhook dedup markers
//! - `security` - webhook signature and API key primitives

use async_trait::async_trait;
use paylink_types::{
    ExternalReference, LinkRef, PaymentLink, PaymentRepository, PaymentStatus, ProductId,
    RepoError, StatusTransition, Transaction, TransactionId,
};

pub mod kv;
pub mod security;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
mod types;

#[cfg(feature = "sqlite")]
#[cfg(test)]
mod sqlite_tests;

pub use kv::MemoryKvStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// Repository wrapper around the configured backend.
///
/// Only SQLite today; a second backend slots in behind the same facade.
#[cfg(feature = "sqlite")]
pub struct Repo {
    inner: sqlite::SqliteRepo,
}

/// Build and initialize a repository from a database URL.
///
/// Connects, runs migrations, and returns a ready-to-use [`Repo`].
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://paylink.db?mode=rwc").await?;
/// ```
#[cfg(feature = "sqlite")]
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    Repo::new(database_url).await
}

#[cfg(feature = "sqlite")]
impl Repo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let inner = sqlite::SqliteRepo::new(database_url).await?;
        Ok(Self { inner })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement PaymentRepository for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
#[async_trait]
impl PaymentRepository for Repo {
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError> {
        self.inner.create_transaction(tx).await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        self.inner.get_transaction(id).await
    }

    async fn find_by_reference(
        &self,
        reference: &ExternalReference,
    ) -> Result<Option<Transaction>, RepoError> {
        self.inner.find_by_reference(reference).await
    }

    async fn find_by_provider_tx_id(
        &self,
        provider_tx_id: &str,
    ) -> Result<Option<Transaction>, RepoError> {
        self.inner.find_by_provider_tx_id(provider_tx_id).await
    }

    async fn mark_processing(
        &self,
        id: TransactionId,
        provider_tx_id: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError> {
        self.inner
            .mark_processing(id, provider_tx_id, raw_response)
            .await
    }

    async fn mark_failed(
        &self,
        id: TransactionId,
        reason: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError> {
        self.inner.mark_failed(id, reason, raw_response).await
    }

    async fn apply_status(
        &self,
        id: TransactionId,
        status: PaymentStatus,
        failure_reason: Option<String>,
        raw_response: Option<serde_json::Value>,
    ) -> Result<StatusTransition, RepoError> {
        self.inner
            .apply_status(id, status, failure_reason, raw_response)
            .await
    }

    async fn find_link(&self, link: &LinkRef) -> Result<Option<PaymentLink>, RepoError> {
        self.inner.find_link(link).await
    }

    async fn decrement_stock(&self, product_id: ProductId) -> Result<bool, RepoError> {
        self.inner.decrement_stock(product_id).await
    }
}

//! SQLite repository adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use paylink_types::{
    ExternalReference, LinkRef, PaymentLink, PaymentRepository, PaymentStatus, ProductId,
    RepoError, StatusTransition, Transaction, TransactionId,
};

use crate::types::{DbPaymentLink, DbTransaction};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> =
            sqlx::query_as(r#"SELECT * FROM transactions WHERE id = ?"#)
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, RepoError> {
        let provider_response = tx
            .provider_response
            .as_ref()
            .map(|v| v.to_string());

        sqlx::query(
            r#"INSERT INTO transactions
               (id, reference, merchant_id, link_id, status, carrier,
                provider_transaction_id, customer_name, customer_phone,
                customer_email, amount, currency, failure_reason,
                provider_response, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.id.to_string())
        .bind(tx.reference.as_str())
        .bind(tx.merchant_id.to_string())
        .bind(tx.link_id.to_string())
        .bind(tx.status.as_ref())
        .bind(tx.carrier.to_string())
        .bind(&tx.provider_transaction_id)
        .bind(&tx.customer_name)
        .bind(tx.customer_phone.as_str())
        .bind(&tx.customer_email)
        .bind(tx.amount.amount())
        .bind(tx.amount.currency().to_string())
        .bind(&tx.failure_reason)
        .bind(provider_response)
        .bind(tx.created_at.to_rfc3339())
        .bind(tx.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(tx)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        self.fetch_transaction(id).await
    }

    async fn find_by_reference(
        &self,
        reference: &ExternalReference,
    ) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> =
            sqlx::query_as(r#"SELECT * FROM transactions WHERE reference = ?"#)
                .bind(reference.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn find_by_provider_tx_id(
        &self,
        provider_tx_id: &str,
    ) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> =
            sqlx::query_as(r#"SELECT * FROM transactions WHERE provider_transaction_id = ?"#)
                .bind(provider_tx_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn mark_processing(
        &self,
        id: TransactionId,
        provider_tx_id: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError> {
        let id_str = id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        // Guarded: only a Pending record without a provider id can advance.
        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = 'PROCESSING', provider_transaction_id = ?,
                   provider_response = ?, updated_at = ?
               WHERE id = ? AND status = 'PENDING' AND provider_transaction_id IS NULL"#,
        )
        .bind(provider_tx_id)
        .bind(raw_response.map(|v| v.to_string()))
        .bind(&now)
        .bind(&id_str)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Release the transaction's connection before re-reading through
            // the pool; holding it open deadlocks a single-connection pool.
            db_tx
                .rollback()
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
            return match self.fetch_transaction(id).await? {
                None => Err(RepoError::NotFound),
                Some(tx) => Err(RepoError::Conflict(format!(
                    "Transaction {} is not pending (status {})",
                    tx.reference, tx.status
                ))),
            };
        }

        // Link usage is accounted here and nowhere else: exactly once per
        // accepted initiation, never again on terminal transitions.
        sqlx::query(
            r#"UPDATE payment_links SET usage_count = usage_count + 1
               WHERE id = (SELECT link_id FROM transactions WHERE id = ?)"#,
        )
        .bind(&id_str)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        self.fetch_transaction(id).await?.ok_or(RepoError::NotFound)
    }

    async fn mark_failed(
        &self,
        id: TransactionId,
        reason: &str,
        raw_response: Option<serde_json::Value>,
    ) -> Result<Transaction, RepoError> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = 'FAILED', failure_reason = ?, provider_response = ?, updated_at = ?
               WHERE id = ? AND status = 'PENDING'"#,
        )
        .bind(reason)
        .bind(raw_response.map(|v| v.to_string()))
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return match self.fetch_transaction(id).await? {
                None => Err(RepoError::NotFound),
                Some(tx) => Err(RepoError::Conflict(format!(
                    "Transaction {} is not pending (status {})",
                    tx.reference, tx.status
                ))),
            };
        }

        self.fetch_transaction(id).await?.ok_or(RepoError::NotFound)
    }

    async fn apply_status(
        &self,
        id: TransactionId,
        status: PaymentStatus,
        failure_reason: Option<String>,
        raw_response: Option<serde_json::Value>,
    ) -> Result<StatusTransition, RepoError> {
        let current = self.fetch_transaction(id).await?.ok_or(RepoError::NotFound)?;

        if current.status.is_terminal() {
            return Ok(StatusTransition::AlreadyTerminal(current));
        }
        if !current.status.can_transition_to(status) {
            return Ok(StatusTransition::Unchanged(current));
        }

        let reason = if status == PaymentStatus::Failed {
            failure_reason
        } else {
            None
        };

        // Optimistic guard on the observed status: a concurrent webhook/poll
        // that got there first leaves this UPDATE with zero rows.
        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = ?, failure_reason = ?, provider_response = ?, updated_at = ?
               WHERE id = ? AND status = ?"#,
        )
        .bind(status.as_ref())
        .bind(reason)
        .bind(raw_response.map(|v| v.to_string()))
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(current.status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let after = self.fetch_transaction(id).await?.ok_or(RepoError::NotFound)?;

        if result.rows_affected() == 0 {
            if after.status.is_terminal() {
                return Ok(StatusTransition::AlreadyTerminal(after));
            }
            return Ok(StatusTransition::Unchanged(after));
        }

        Ok(StatusTransition::Applied(after))
    }

    async fn find_link(&self, link: &LinkRef) -> Result<Option<PaymentLink>, RepoError> {
        let query = r#"SELECT l.id, l.merchant_id, l.slug, l.amount, l.currency,
                              l.is_active, l.expires_at, l.usage_limit, l.usage_count,
                              l.product_id, p.name AS product_name, p.stock AS product_stock
                       FROM payment_links l
                       LEFT JOIN products p ON p.id = l.product_id"#;

        let row: Option<DbPaymentLink> = match link {
            LinkRef::Id(id) => {
                sqlx::query_as(&format!("{} WHERE l.id = ?", query))
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await
            }
            LinkRef::Slug(slug) => {
                sqlx::query_as(&format!("{} WHERE l.slug = ?", query))
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPaymentLink::into_domain).transpose()
    }

    async fn decrement_stock(&self, product_id: ProductId) -> Result<bool, RepoError> {
        // Finite, strictly positive stock only; the -1 sentinel never matches.
        let result = sqlx::query(
            r#"UPDATE products SET stock = stock - 1 WHERE id = ? AND stock > 0"#,
        )
        .bind(product_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

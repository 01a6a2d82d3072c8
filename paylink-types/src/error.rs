//! Error types for the payment link service.

use crate::domain::{PaymentStatus, TransactionId};

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Payment link is not active")]
    LinkInactive,

    #[error("Payment link has expired")]
    LinkExpired,

    #[error("Payment link usage limit reached")]
    LinkExhausted,

    #[error("Linked product is out of stock")]
    OutOfStock,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Errors raised by the external payment provider gateway.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider authentication failed: {0}")]
    Authentication(String),

    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider HTTP error: {0}")]
    Http(String),

    #[error("Provider returned an unparseable body: {0}")]
    MalformedResponse(String),
}

/// Failure of an isolated terminal side effect (receipt, mail, stock).
///
/// Never propagated past the effects orchestrator - carried only so the
/// orchestrator has something concrete to log.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EffectError(pub String);

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::TransactionNotFound(id) => {
                AppError::NotFound(format!("Transaction not found: {}", id))
            }
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}

impl From<ProviderError> for AppError {
    // The provider's raw message is retained on the transaction record, not
    // echoed to the client.
    fn from(_: ProviderError) -> Self {
        AppError::BadRequest("Failed to initiate payment with the provider".into())
    }
}

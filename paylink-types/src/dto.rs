//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Carrier, Currency, LinkId, PaymentStatus, Transaction};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Payment initiation DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Selector for the payment link being paid: by id or by public slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRef {
    Id(LinkId),
    Slug(String),
}

/// Request to initiate a payment through a link.
///
/// Exactly one of `paymentLinkId` / `slug` must be supplied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<uuid::Uuid>)]
    pub payment_link_id: Option<LinkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "pay-abc")]
    pub slug: Option<String>,
    #[schema(example = "Jean Mbarga")]
    pub customer_name: String,
    /// Raw customer phone; normalized to `+237…` before storage.
    #[schema(example = "0612345678")]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub payment_provider: Carrier,
}

impl InitiatePaymentRequest {
    /// Resolves the link selector, rejecting both-or-neither requests.
    pub fn link_ref(&self) -> Result<LinkRef, DomainError> {
        match (&self.payment_link_id, &self.slug) {
            (Some(_), Some(_)) => Err(DomainError::Validation(
                "Provide either paymentLinkId or slug, not both".into(),
            )),
            (Some(id), None) => Ok(LinkRef::Id(*id)),
            (None, Some(slug)) if !slug.trim().is_empty() => Ok(LinkRef::Slug(slug.clone())),
            _ => Err(DomainError::Validation(
                "Either paymentLinkId or slug is required".into(),
            )),
        }
    }
}

/// Response to a successful (or replayed) initiation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    /// This system's globally-unique reference, e.g. `TXN-1724912345678-A1B2C3D4`.
    pub reference: String,
    pub status: PaymentStatus,
    pub provider_transaction_id: Option<String>,
    pub amount: i64,
    pub currency: Currency,
    pub payment_provider: Carrier,
}

impl From<&Transaction> for InitiatePaymentResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            reference: tx.reference.as_str().to_string(),
            status: tx.status,
            provider_transaction_id: tx.provider_transaction_id.clone(),
            amount: tx.amount.amount(),
            currency: tx.amount.currency(),
            payment_provider: tx.carrier,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status / view DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Public view of a transaction, returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub reference: String,
    pub status: PaymentStatus,
    pub provider_transaction_id: Option<String>,
    pub amount: i64,
    pub currency: Currency,
    pub payment_provider: Carrier,
    pub customer_name: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            reference: tx.reference.as_str().to_string(),
            status: tx.status,
            provider_transaction_id: tx.provider_transaction_id.clone(),
            amount: tx.amount.amount(),
            currency: tx.amount.currency(),
            payment_provider: tx.carrier,
            customer_name: tx.customer_name.clone(),
            failure_reason: tx.failure_reason.clone(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Push notification schema delivered by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// The provider-assigned transaction id.
    pub transaction_id: String,
    /// Provider status vocabulary, mapped internally.
    #[schema(example = "SUCCESSFUL")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Acknowledgement returned to the provider for every delivery.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

impl WebhookAck {
    pub fn processed(status: PaymentStatus) -> Self {
        Self {
            received: true,
            duplicate: false,
            status: Some(status),
        }
    }

    pub fn duplicate() -> Self {
        Self {
            received: true,
            duplicate: true,
            status: None,
        }
    }

    pub fn ignored() -> Self {
        Self {
            received: true,
            duplicate: false,
            status: None,
        }
    }
}

//! Payment provider port and the audit record of outbound calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Carrier, ExternalReference, Money, PaymentStatus, PhoneNumber};
use crate::error::ProviderError;

/// One outbound call to the provider, with secrets already stripped.
///
/// Kept in a bounded in-memory ring buffer; not persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogEntry {
    pub endpoint: String,
    pub method: String,
    pub request_body: Option<serde_json::Value>,
    pub response_body: Option<serde_json::Value>,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// Everything the provider needs to start collecting a payment.
#[derive(Debug, Clone)]
pub struct ProviderInitiateRequest {
    pub amount: Money,
    pub phone: PhoneNumber,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub carrier: Carrier,
    /// Our reference, echoed back by the provider for correlation.
    pub reference: ExternalReference,
}

/// The provider accepted an initiation.
#[derive(Debug, Clone)]
pub struct ProviderAcceptance {
    pub provider_transaction_id: String,
    pub status: PaymentStatus,
    pub message: Option<String>,
    pub raw: serde_json::Value,
}

/// The provider's current view of a payment, mapped to the internal enum.
#[derive(Debug, Clone)]
pub struct ProviderStatusView {
    pub status: PaymentStatus,
    pub message: Option<String>,
    pub raw: serde_json::Value,
}

/// Gateway to the external mobile-money provider.
///
/// Implementations authenticate on the caller's behalf (cached bearer
/// token) and record every call - success or failure - in the audit trail.
#[async_trait::async_trait]
pub trait ProviderClient: Send + Sync + 'static {
    /// Asks the provider to start collecting the payment.
    async fn initiate(
        &self,
        req: ProviderInitiateRequest,
    ) -> Result<ProviderAcceptance, ProviderError>;

    /// Polls the provider for the current status of a payment.
    async fn check_status(
        &self,
        provider_tx_id: &str,
    ) -> Result<ProviderStatusView, ProviderError>;

    /// Whether the provider endpoint is currently reachable.
    async fn healthcheck(&self) -> bool;

    /// Most recent outbound calls, newest first.
    fn recent_calls(&self, limit: usize) -> Vec<ApiLogEntry>;
}

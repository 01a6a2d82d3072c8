//! # PayLink Client SDK
//!
//! A typed Rust client for the payment link API.

use paylink_types::{
    ApiLogEntry, Carrier, InitiatePaymentRequest, InitiatePaymentResponse, LinkId, TransactionView,
};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Customer details for a payment initiation.
#[derive(Debug, Clone)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// PayLink API client.
pub struct PayLinkClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl PayLinkClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: Client::new(),
        }
    }

    /// Sets the API key for the merchant endpoints.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Initiates a payment through a link identified by its public slug.
    ///
    /// The idempotency key makes retries safe: the same key always yields
    /// the same payment.
    pub async fn initiate_by_slug(
        &self,
        slug: &str,
        carrier: Carrier,
        customer: Customer,
        idempotency_key: &str,
    ) -> Result<InitiatePaymentResponse, ClientError> {
        let req = InitiatePaymentRequest {
            payment_link_id: None,
            slug: Some(slug.to_string()),
            customer_name: customer.name,
            customer_phone: customer.phone,
            customer_email: customer.email,
            payment_provider: carrier,
        };
        self.initiate(&req, idempotency_key).await
    }

    /// Initiates a payment through a link identified by its id.
    pub async fn initiate_by_link_id(
        &self,
        link_id: LinkId,
        carrier: Carrier,
        customer: Customer,
        idempotency_key: &str,
    ) -> Result<InitiatePaymentResponse, ClientError> {
        let req = InitiatePaymentRequest {
            payment_link_id: Some(link_id),
            slug: None,
            customer_name: customer.name,
            customer_phone: customer.phone,
            customer_email: customer.email,
            payment_provider: carrier,
        };
        self.initiate(&req, idempotency_key).await
    }

    async fn initiate(
        &self,
        req: &InitiatePaymentRequest,
        idempotency_key: &str,
    ) -> Result<InitiatePaymentResponse, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/payments/initiate", self.base_url))
            .header("Idempotency-Key", idempotency_key)
            .json(req)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets the current status of a payment by its reference.
    pub async fn payment_status(&self, reference: &str) -> Result<TransactionView, ClientError> {
        self.get(&format!("/api/payments/status/{}", reference))
            .await
    }

    /// Gets a transaction by internal id (requires an API key).
    pub async fn get_payment(&self, id: &str) -> Result<TransactionView, ClientError> {
        self.get(&format!("/api/payments/{}", id)).await
    }

    /// Whether the upstream payment provider is reachable.
    pub async fn provider_health(&self) -> Result<bool, ClientError> {
        let mut req = self
            .http
            .get(format!("{}/api/provider/health", self.base_url));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        Ok(resp.status().is_success())
    }

    /// Recent outbound provider calls (requires an API key).
    pub async fn provider_logs(&self, limit: usize) -> Result<Vec<ApiLogEntry>, ClientError> {
        self.get(&format!("/api/provider/logs?limit={}", limit))
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let mut req = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PayLinkClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PayLinkClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_api_key() {
        let client = PayLinkClient::new("http://localhost:3000").with_api_key("test-key");
        assert_eq!(client.api_key, Some("test-key".to_string()));
    }
}

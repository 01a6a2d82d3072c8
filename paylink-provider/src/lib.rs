//! # PayLink Provider
//!
//! Outbound gateway to the external mobile-money payment provider.
//!
//! The gateway owns three concerns:
//! - credential exchange with a cached bearer token (cache validity is kept
//!   shorter than the provider's own token lifetime),
//! - initiation and status-check calls, tolerant of the several response
//!   shapes the provider emits,
//! - a redacted audit trail of every outbound call.

pub mod audit;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use paylink_types::{
    ApiLogEntry, PaymentStatus, ProviderAcceptance, ProviderClient, ProviderError,
    ProviderInitiateRequest, ProviderStatusView,
};

use audit::{ApiAuditLog, redact};

// ─────────────────────────────────────────────────────────────────────────────
// Response-shape extraction rules
// ─────────────────────────────────────────────────────────────────────────────

// The provider's response shapes vary by endpoint version; each list is
// tried in order and the first match wins. Adding a shape is a data change.

const TOKEN_POINTERS: &[&str] = &[
    "/token",
    "/accessToken",
    "/access_token",
    "/data/token",
    "/data/accessToken",
    "/data/access_token",
    "/result/token",
];

const TX_ID_POINTERS: &[&str] = &[
    "/transactionId",
    "/transId",
    "/id",
    "/reference",
    "/data/transactionId",
    "/data/transId",
    "/data/id",
    "/result/transactionId",
];

const STATUS_POINTERS: &[&str] = &[
    "/status",
    "/transactionStatus",
    "/data/status",
    "/result/status",
];

const MESSAGE_POINTERS: &[&str] = &["/message", "/error", "/data/message", "/result/message"];

const EXPIRES_IN_POINTERS: &[&str] = &["/expiresIn", "/expires_in", "/data/expiresIn"];

fn extract_string(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| {
        value.pointer(pointer).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}

fn extract_i64(value: &Value, pointers: &[&str]) -> Option<i64> {
    pointers
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_i64))
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration & token cache
// ─────────────────────────────────────────────────────────────────────────────

/// Static provider credentials and wire parameters.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub country: String,
    pub currency: String,
}

impl ProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(30),
            country: "CM".into(),
            currency: "XAF".into(),
        }
    }
}

/// Safety margin subtracted from the provider's token lifetime.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Assumed token lifetime when the provider does not report one.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Explicit bearer-token cache, owned by the gateway.
///
/// Read-mostly: a miss may let two concurrent callers both re-authenticate,
/// which the provider treats as idempotent, so no guard spans the exchange.
struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn live(&self) -> Option<String> {
        let cached = self.inner.lock().expect("token cache lock poisoned");
        cached
            .as_ref()
            .filter(|t| Instant::now() < t.expires_at)
            .map(|t| t.token.clone())
    }

    fn store(&self, token: String, lifetime: Duration) {
        let validity = lifetime
            .checked_sub(TOKEN_EXPIRY_MARGIN)
            .unwrap_or(Duration::from_secs(0));
        let mut cached = self.inner.lock().expect("token cache lock poisoned");
        *cached = Some(CachedToken {
            token,
            expires_at: Instant::now() + validity,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP gateway to the payment provider.
pub struct ProviderGateway {
    http: reqwest::Client,
    config: ProviderConfig,
    token: TokenCache,
    audit: ApiAuditLog,
}

impl ProviderGateway {
    pub fn new(config: ProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            config,
            token: TokenCache::new(),
            audit: ApiAuditLog::default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// Sends one call and appends a redacted audit entry, success or not.
    async fn send_logged(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<(u16, Value), ProviderError> {
        let started = Instant::now();
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let outcome = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let text = response.text().await.unwrap_or_default();
                let parsed: Value =
                    serde_json::from_str(&text).unwrap_or(Value::String(text));
                Ok((status, parsed))
            }
            Err(e) => Err(ProviderError::Http(e.to_string())),
        };

        let (status_code, response_body, error) = match &outcome {
            Ok((status, parsed)) => (Some(*status), Some(redact(parsed)), None),
            Err(e) => (None, None, Some(e.to_string())),
        };

        self.audit.record(ApiLogEntry {
            endpoint: path.to_string(),
            method: method.to_string(),
            request_body: body.as_ref().map(redact),
            response_body,
            status_code,
            duration_ms: started.elapsed().as_millis() as u64,
            error,
            at: Utc::now(),
        });

        outcome
    }

    /// Returns a live bearer token, exchanging credentials when needed.
    pub async fn authenticate(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.token.live() {
            return Ok(token);
        }

        let body = json!({
            "clientId": self.config.client_id,
            "clientSecret": self.config.client_secret,
        });

        let (status, response) = self
            .send_logged(reqwest::Method::POST, "auth/token", Some(body), None)
            .await
            .map_err(|e| ProviderError::Authentication(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = extract_string(&response, MESSAGE_POINTERS)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ProviderError::Authentication(message));
        }

        let token = extract_string(&response, TOKEN_POINTERS).ok_or_else(|| {
            ProviderError::Authentication("No token field in auth response".into())
        })?;

        let lifetime = extract_i64(&response, EXPIRES_IN_POINTERS)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        self.token.store(token.clone(), lifetime);
        tracing::debug!("Provider token refreshed (lifetime {:?})", lifetime);
        Ok(token)
    }
}

#[async_trait]
impl ProviderClient for ProviderGateway {
    async fn initiate(
        &self,
        req: ProviderInitiateRequest,
    ) -> Result<ProviderAcceptance, ProviderError> {
        let token = self.authenticate().await?;

        let body = json!({
            "amount": req.amount.amount(),
            "currency": self.config.currency,
            "country": self.config.country,
            "paymentMode": req.carrier.wire_code(),
            "phoneNumber": req.phone.as_str(),
            "customerName": req.customer_name,
            "customerEmail": req.customer_email,
            "externalReference": req.reference.as_str(),
        });

        let (status, response) = self
            .send_logged(
                reqwest::Method::POST,
                "payments/initiate",
                Some(body),
                Some(&token),
            )
            .await?;

        let message = extract_string(&response, MESSAGE_POINTERS);

        if !(200..300).contains(&status) {
            return Err(ProviderError::Request(
                message.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        let provider_transaction_id =
            extract_string(&response, TX_ID_POINTERS).ok_or_else(|| {
                ProviderError::Request(
                    message
                        .clone()
                        .unwrap_or_else(|| "No transaction id in provider response".into()),
                )
            })?;

        let mapped = extract_string(&response, STATUS_POINTERS)
            .map(|raw| PaymentStatus::from_provider(&raw))
            .unwrap_or(PaymentStatus::Processing);

        Ok(ProviderAcceptance {
            provider_transaction_id,
            status: mapped,
            message,
            raw: response,
        })
    }

    async fn check_status(
        &self,
        provider_tx_id: &str,
    ) -> Result<ProviderStatusView, ProviderError> {
        let token = self.authenticate().await?;

        let (status, response) = self
            .send_logged(
                reqwest::Method::GET,
                &format!("payments/status/{}", provider_tx_id),
                None,
                Some(&token),
            )
            .await?;

        let message = extract_string(&response, MESSAGE_POINTERS);

        if !(200..300).contains(&status) {
            return Err(ProviderError::Request(
                message.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        let raw_status = extract_string(&response, STATUS_POINTERS).ok_or_else(|| {
            ProviderError::MalformedResponse("No status field in provider response".into())
        })?;

        Ok(ProviderStatusView {
            status: PaymentStatus::from_provider(&raw_status),
            message,
            raw: response,
        })
    }

    async fn healthcheck(&self) -> bool {
        match self.http.get(self.url("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn recent_calls(&self, limit: usize) -> Vec<ApiLogEntry> {
        self.audit.recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_extraction_tries_shapes_in_order() {
        let flat = json!({"token": "t1"});
        assert_eq!(extract_string(&flat, TOKEN_POINTERS).as_deref(), Some("t1"));

        let snake = json!({"access_token": "t2"});
        assert_eq!(
            extract_string(&snake, TOKEN_POINTERS).as_deref(),
            Some("t2")
        );

        let nested = json!({"data": {"accessToken": "t3"}});
        assert_eq!(
            extract_string(&nested, TOKEN_POINTERS).as_deref(),
            Some("t3")
        );

        let none = json!({"message": "ok"});
        assert_eq!(extract_string(&none, TOKEN_POINTERS), None);
    }

    #[test]
    fn test_tx_id_extraction_accepts_numeric_ids() {
        let numeric = json!({"data": {"id": 98765}});
        assert_eq!(
            extract_string(&numeric, TX_ID_POINTERS).as_deref(),
            Some("98765")
        );
    }

    #[test]
    fn test_tx_id_extraction_ignores_empty_strings() {
        let empty = json!({"transactionId": "", "data": {"transId": "FAP-9"}});
        assert_eq!(
            extract_string(&empty, TX_ID_POINTERS).as_deref(),
            Some("FAP-9")
        );
    }

    #[test]
    fn test_token_cache_expires_with_margin() {
        let cache = TokenCache::new();
        assert!(cache.live().is_none());

        // Lifetime below the safety margin: cached but immediately stale.
        cache.store("short".into(), Duration::from_secs(30));
        assert!(cache.live().is_none());

        cache.store("long".into(), Duration::from_secs(3600));
        assert_eq!(cache.live().as_deref(), Some("long"));
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = ProviderConfig::new("https://api.provider.test/", "id", "secret");
        assert_eq!(config.base_url, "https://api.provider.test");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}

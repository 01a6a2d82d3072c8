//! Authentication middleware for the merchant-facing endpoints.
//!
//! Customer-facing routes (initiation, status, webhooks, health) are
//! public; everything else requires the configured API key as a Bearer
//! token, compared in constant time.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use paylink_repo::security::verify_api_key;

/// Holds the configured API key; `None` disables authentication (dev only).
pub struct AuthConfig {
    api_key: Option<String>,
}

impl AuthConfig {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("No API key configured, merchant endpoints are open");
        }
        Self { api_key }
    }
}

/// Extracts the API key from the Authorization header.
/// Expected format: "Bearer <api_key>" or just "<api_key>"
fn extract_api_key(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

fn is_public(method: &Method, path: &str) -> bool {
    path == "/health"
        || path == "/api/openapi.json"
        || path.starts_with("/api/payments/status/")
        || (path == "/api/payments/initiate" && method == Method::POST)
        || (path == "/api/webhooks/payment" && method == Method::POST)
}

/// Validates the Bearer API key on non-public routes.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_public(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let Some(configured) = &auth.api_key else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match extract_api_key(auth_header) {
        Some(key) if !key.is_empty() && verify_api_key(key, configured) => {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing or invalid Authorization header"),
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": message,
            "code": 401
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key_bearer() {
        assert_eq!(
            extract_api_key(Some("Bearer sk_test_123")),
            Some("sk_test_123")
        );
    }

    #[test]
    fn test_extract_api_key_raw() {
        assert_eq!(extract_api_key(Some("sk_test_123")), Some("sk_test_123"));
    }

    #[test]
    fn test_extract_api_key_none() {
        assert_eq!(extract_api_key(None), None);
    }

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::GET, "/api/payments/status/TXN-1-ABCD1234"));
        assert!(is_public(&Method::POST, "/api/payments/initiate"));
        assert!(is_public(&Method::POST, "/api/webhooks/payment"));
        assert!(!is_public(&Method::GET, "/api/provider/logs"));
        assert!(!is_public(
            &Method::GET,
            "/api/payments/11111111-2222-3333-4444-555555555555"
        ));
    }
}

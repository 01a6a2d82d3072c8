//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use paylink_types::{
    AppError, InitiatePaymentRequest, PaymentRepository, TransactionId, WebhookAck,
};

use crate::service::PaymentService;
use crate::webhook::WebhookService;

/// Application state shared across handlers.
pub struct AppState<R: PaymentRepository> {
    pub service: PaymentService<R>,
    pub webhooks: WebhookService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Initiate a payment through a link. Requires an `Idempotency-Key` header.
#[tracing::instrument(skip(state, req), fields(customer = %req.customer_name))]
pub async fn initiate_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Idempotency-Key header".into()))?;

    let response = state.service.initiate(idempotency_key, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Public status endpoint, keyed by this system's reference.
#[tracing::instrument(skip(state), fields(reference = %reference))]
pub async fn payment_status<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.service.query_status(&reference).await?;
    Ok(Json(view))
}

/// Get a transaction by internal id.
#[tracing::instrument(skip(state), fields(transaction_id = %id))]
pub async fn get_payment<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: TransactionId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid transaction ID".into()))?;

    let view = state.service.get_transaction(id).await?;
    Ok(Json(view))
}

/// Provider webhook receiver.
///
/// Takes the raw body so the signature covers the exact delivered bytes.
/// Everything except an authentication failure is acknowledged with 200;
/// any other status would put the provider on a retry schedule.
#[tracing::instrument(skip_all)]
pub async fn payment_webhook<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());

    match state.webhooks.handle(&body, signature).await {
        Ok(ack) => Ok(Json(ack)),
        Err(err @ AppError::Unauthorized(_)) => Err(err.into()),
        Err(err) => {
            tracing::warn!("Webhook processing failed, acknowledging anyway: {}", err);
            Ok(Json(WebhookAck::ignored()))
        }
    }
}

/// Provider reachability probe.
#[tracing::instrument(skip(state))]
pub async fn provider_health<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    let reachable = state.service.provider().healthcheck().await;
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(serde_json::json!({ "reachable": reachable })))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Recent outbound provider calls, newest first, secrets redacted.
#[tracing::instrument(skip(state))]
pub async fn provider_logs<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(50).min(200);
    Json(state.service.provider().recent_calls(limit))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}

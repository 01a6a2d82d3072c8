//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use paylink_types::PaymentRepository;

use super::auth::{AuthConfig, auth_middleware};
use super::handlers::{self, AppState};
use crate::service::PaymentService;
use crate::webhook::WebhookService;

/// HTTP Server for the payment link API.
pub struct HttpServer<R: PaymentRepository> {
    state: Arc<AppState<R>>,
    auth: Arc<AuthConfig>,
}

impl<R: PaymentRepository> HttpServer<R> {
    /// Creates a new HTTP server around the application services.
    pub fn new(
        service: PaymentService<R>,
        webhooks: WebhookService<R>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            state: Arc::new(AppState { service, webhooks }),
            auth: Arc::new(AuthConfig::new(api_key)),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/openapi.json", get(handlers::openapi_json))
            .route(
                "/api/payments/initiate",
                post(handlers::initiate_payment::<R>),
            )
            .route(
                "/api/payments/status/{reference}",
                get(handlers::payment_status::<R>),
            )
            .route("/api/payments/{id}", get(handlers::get_payment::<R>))
            .route(
                "/api/webhooks/payment",
                post(handlers::payment_webhook::<R>),
            )
            .route("/api/provider/health", get(handlers::provider_health::<R>))
            .route("/api/provider/logs", get(handlers::provider_logs::<R>))
            .layer(middleware::from_fn_with_state(
                self.auth.clone(),
                auth_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}

//! End-to-end test: real SQLite storage, real HTTP server, real gateway,
//! with the provider faked by a local axum server.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::Path,
    routing::{get, post},
};
use serde_json::json;
use tempfile::TempDir;

use paylink_client::{Customer, PayLinkClient};
use paylink_hex::{EffectsOrchestrator, HttpServer, PaymentService, WebhookService};
use paylink_provider::{ProviderConfig, ProviderGateway};
use paylink_repo::{MemoryKvStore, SqliteRepo};
use paylink_types::{
    Carrier, EffectError, EmailMessage, KvStore, Mailer, PaymentStatus, ProviderClient, Receipt,
    ReceiptGenerator, Transaction,
};

struct NoopReceipts;

#[async_trait]
impl ReceiptGenerator for NoopReceipts {
    async fn generate(&self, tx: &Transaction) -> Result<Receipt, EffectError> {
        Ok(Receipt {
            file_name: format!("{}.txt", tx.reference),
            bytes: Vec::new(),
        })
    }
}

struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _message: EmailMessage) -> Result<(), EffectError> {
        Ok(())
    }
}

/// A stand-in provider speaking the real wire shapes.
async fn spawn_fake_provider() -> String {
    let app = Router::new()
        .route(
            "/auth/token",
            post(|| async { Json(json!({"token": "test-token", "expiresIn": 3600})) }),
        )
        .route(
            "/payments/initiate",
            post(|| async {
                Json(json!({"transactionId": "FAP-IT-1", "status": "ACCEPTED"}))
            }),
        )
        .route(
            "/payments/status/{id}",
            get(|Path(_id): Path<String>| async { Json(json!({"status": "SUCCESSFUL"})) }),
        )
        .route("/health", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_server(provider_url: &str, dir: &TempDir) -> String {
    let db_path = dir.path().join("paylink-test.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let repo = Arc::new(SqliteRepo::new(&database_url).await.unwrap());

    // Seed one active link for the walkthrough.
    sqlx::query(
        "INSERT INTO payment_links (id, merchant_id, slug, amount, currency, is_active, usage_count, created_at)
         VALUES (?, ?, 'pay-tshirt', 5000, 'XAF', 1, 0, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(repo.pool())
    .await
    .unwrap();

    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let provider: Arc<dyn ProviderClient> = Arc::new(ProviderGateway::new(ProviderConfig::new(
        provider_url,
        "test-client-id",
        "test-client-secret",
    )));

    let effects = EffectsOrchestrator::new(repo.clone(), Arc::new(NoopReceipts), Arc::new(NoopMailer));
    let service = PaymentService::new(repo.clone(), provider, kv.clone(), effects.clone());
    let webhooks = WebhookService::new(repo, kv, effects, None);

    let server = HttpServer::new(service, webhooks, None);
    let router = server.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_full_payment_walkthrough() {
    let provider_url = spawn_fake_provider().await;
    let dir = TempDir::new().unwrap();
    let base_url = spawn_server(&provider_url, &dir).await;

    let client = PayLinkClient::new(&base_url);
    assert!(client.health().await.unwrap());
    assert!(client.provider_health().await.unwrap());

    let customer = Customer {
        name: "Jean Mbarga".into(),
        phone: "0612345678".into(),
        email: None,
    };

    let response = client
        .initiate_by_slug("pay-tshirt", Carrier::MtnMomo, customer.clone(), "it-key-1")
        .await
        .unwrap();
    assert_eq!(response.status, PaymentStatus::Processing);
    assert_eq!(response.amount, 5000);
    assert_eq!(response.provider_transaction_id.as_deref(), Some("FAP-IT-1"));

    // Same key replays the stored outcome.
    let replay = client
        .initiate_by_slug("pay-tshirt", Carrier::MtnMomo, customer, "it-key-1")
        .await
        .unwrap();
    assert_eq!(replay.reference, response.reference);

    // The fake provider reports SUCCESSFUL; polling reconciles and seals it.
    let view = client.payment_status(&response.reference).await.unwrap();
    assert_eq!(view.status, PaymentStatus::Success);

    let again = client.payment_status(&response.reference).await.unwrap();
    assert_eq!(again.status, PaymentStatus::Success);

    // The gateway kept a redacted audit trail of its calls.
    let logs = client.provider_logs(10).await.unwrap();
    assert!(!logs.is_empty());
    assert!(
        logs.iter()
            .all(|entry| !format!("{:?}", entry.request_body).contains("test-client-secret"))
    );
}

//! # PayLink Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository and key/value adapters
//! - Connect the provider gateway
//! - Create the application services
//! - Start the HTTP server

mod adapters;
mod config;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paylink_hex::{EffectsOrchestrator, HttpServer, PaymentService, WebhookService};
use paylink_provider::{ProviderConfig, ProviderGateway};
use paylink_repo::build_repo;
use paylink_repo::kv::MemoryKvStore;
use paylink_types::{KvStore, ProviderClient};

use adapters::{LogMailer, TextReceiptGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,paylink_app=debug,paylink_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting paylink server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);

    // Build repository (handles connection and migration)
    let repo = Arc::new(build_repo(&config.database_url).await?);

    // Ephemeral store for idempotency records and webhook dedup markers
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());

    // Provider gateway
    let provider: Arc<dyn ProviderClient> = Arc::new(ProviderGateway::new(ProviderConfig::new(
        config.provider_base_url.clone(),
        config.provider_client_id.clone(),
        config.provider_client_secret.clone(),
    )));

    // Application services
    let effects = EffectsOrchestrator::new(
        repo.clone(),
        Arc::new(TextReceiptGenerator),
        Arc::new(LogMailer),
    );
    let service = PaymentService::new(repo.clone(), provider, kv.clone(), effects.clone());
    let webhooks = WebhookService::new(repo, kv, effects, config.webhook_secret.clone());

    // Create and run the HTTP server
    let server = HttpServer::new(service, webhooks, config.api_key.clone());
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}

//! PayLink CLI
//!
//! Command-line interface for the payment link API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use paylink_client::{Customer, PayLinkClient};
use paylink_types::Carrier;

#[derive(Parser)]
#[command(name = "paylink")]
#[command(author, version, about = "PayLink API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the PayLink API
    #[arg(long, env = "PAYLINK_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// API key for the merchant endpoints
    #[arg(long, env = "PAYLINK_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Payment operations
    Pay {
        #[command(subcommand)]
        action: PayCommands,
    },
    /// Provider gateway diagnostics
    Provider {
        #[command(subcommand)]
        action: ProviderCommands,
    },
    /// Start a local webhook listener for debugging deliveries
    Listen {
        /// Port to listen on
        #[arg(long, default_value = "3001")]
        port: u16,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum PayCommands {
    /// Initiate a payment through a link slug
    Initiate {
        /// Public slug of the payment link
        #[arg(long)]
        slug: String,
        /// Customer name
        #[arg(long)]
        name: String,
        /// Customer phone number
        #[arg(long)]
        phone: String,
        /// Customer email (optional, used for the receipt)
        #[arg(long)]
        email: Option<String>,
        /// Carrier (MTN_MOMO or ORANGE_MONEY)
        #[arg(long, default_value = "MTN_MOMO")]
        carrier: String,
        /// Idempotency key; retries with the same key are safe
        #[arg(long)]
        idempotency_key: String,
    },
    /// Check the status of a payment by reference
    Status {
        /// Payment reference, e.g. TXN-1724912345678-A1B2C3D4
        reference: String,
    },
    /// Get a transaction by internal id
    Get {
        /// Transaction ID (UUID)
        id: String,
    },
}

#[derive(Subcommand)]
enum ProviderCommands {
    /// Check provider reachability
    Health,
    /// Show recent outbound provider calls (secrets redacted)
    Logs {
        /// Number of entries, newest first
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn parse_carrier(s: &str) -> Result<Carrier> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Unknown carrier: {}. Supported: MTN_MOMO, ORANGE_MONEY", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PayLinkClient::new(&cli.api_url);
    if let Some(key) = cli.api_key {
        client = client.with_api_key(key);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Pay { action } => match action {
            PayCommands::Initiate {
                slug,
                name,
                phone,
                email,
                carrier,
                idempotency_key,
            } => {
                let carrier = parse_carrier(&carrier)?;
                let customer = Customer {
                    name,
                    phone,
                    email,
                };
                let response = client
                    .initiate_by_slug(&slug, carrier, customer, &idempotency_key)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            PayCommands::Status { reference } => {
                let view = client.payment_status(&reference).await?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            PayCommands::Get { id } => {
                let view = client.get_payment(&id).await?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        },

        Commands::Provider { action } => match action {
            ProviderCommands::Health => {
                let reachable = client.provider_health().await?;
                if reachable {
                    println!("✓ Provider is reachable");
                } else {
                    println!("✗ Provider is unreachable");
                    std::process::exit(1);
                }
            }
            ProviderCommands::Logs { limit } => {
                let logs = client.provider_logs(limit).await?;
                println!("{}", serde_json::to_string_pretty(&logs)?);
            }
        },

        Commands::Listen { port } => {
            let app = axum::Router::new().route("/webhook", axum::routing::post(handle_webhook));
            let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
            println!("Listening for webhooks on {}", addr);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

async fn handle_webhook(
    headers: axum::http::HeaderMap,
    body: String,
) -> impl axum::response::IntoResponse {
    println!("POST /webhook HTTP/1.1");
    for (name, value) in &headers {
        println!("{}: {:?}", name, value);
    }
    println!();
    println!("{}", body);
    println!("----------------------------------------");
    axum::http::StatusCode::OK
}

//! End-to-end client walkthrough against a running server.
//!
//! Start the server first (`cargo run --bin paylink-server`), seed a payment
//! link, then run:
//!
//! ```sh
//! cargo run --example client_example --features sqlite -- pay-tshirt
//! ```

use std::time::Duration;

use paylink_client::{Customer, PayLinkClient};
use paylink_types::{Carrier, PaymentStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let slug = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pay-tshirt".to_string());

    let client = PayLinkClient::new("http://localhost:3000");

    if !client.health().await? {
        anyhow::bail!("Server is not healthy");
    }

    let idempotency_key = format!("example-{}", uuid_like());
    let customer = Customer {
        name: "Jean Mbarga".into(),
        phone: "0612345678".into(),
        email: Some("jean@example.com".into()),
    };

    println!("Initiating payment through link '{}'", slug);
    let response = client
        .initiate_by_slug(&slug, Carrier::MtnMomo, customer, &idempotency_key)
        .await?;
    println!("-> reference {} ({})", response.reference, response.status);

    // Poll until the payment settles; the customer confirms on their phone.
    for _ in 0..30 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let view = client.payment_status(&response.reference).await?;
        println!("   status: {}", view.status);
        if view.status.is_terminal() {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }
    }

    println!("Payment still {} after polling, giving up", PaymentStatus::Processing);
    Ok(())
}

fn uuid_like() -> String {
    format!("{:x}", std::time::UNIX_EPOCH.elapsed().map(|d| d.as_nanos()).unwrap_or(0))
}

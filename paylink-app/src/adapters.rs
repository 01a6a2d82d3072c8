//! Outbound adapters for terminal effects.
//!
//! Receipts are rendered as plain text and mail delivery goes to the log.
//! Real PDF rendering and an SMTP transport plug in behind the same ports.

use async_trait::async_trait;

use paylink_types::{EffectError, EmailMessage, Mailer, Receipt, ReceiptGenerator, Transaction};

/// Renders a plain-text receipt for a settled payment.
pub struct TextReceiptGenerator;

#[async_trait]
impl ReceiptGenerator for TextReceiptGenerator {
    async fn generate(&self, tx: &Transaction) -> Result<Receipt, EffectError> {
        let body = format!(
            "PAYMENT RECEIPT\n\
             ================\n\
             Reference:  {}\n\
             Customer:   {}\n\
             Amount:     {}\n\
             Carrier:    {}\n\
             Settled at: {}\n",
            tx.reference,
            tx.customer_name,
            tx.amount,
            tx.carrier,
            tx.updated_at.to_rfc3339(),
        );
        Ok(Receipt {
            file_name: format!("{}.txt", tx.reference),
            bytes: body.into_bytes(),
        })
    }
}

/// Logs outbound mail instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EffectError> {
        tracing::info!(
            "Mail to {}: {} ({} byte attachment)",
            message.to,
            message.subject,
            message
                .attachment
                .as_ref()
                .map(|a| a.bytes.len())
                .unwrap_or(0)
        );
        Ok(())
    }
}

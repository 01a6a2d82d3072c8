//! Terminal side effects: stock accounting, receipts and notification mail.
//!
//! Runs after a terminal status is committed. Every effect is isolated:
//! a failed receipt never blocks the email, and no effect failure ever
//! changes the transaction record or the HTTP response that triggered it.

use std::sync::Arc;

use paylink_types::{
    EmailMessage, LinkRef, Mailer, PaymentRepository, PaymentStatus, Receipt, ReceiptGenerator,
    Transaction,
};

pub struct EffectsOrchestrator<R: PaymentRepository> {
    repo: Arc<R>,
    receipts: Arc<dyn ReceiptGenerator>,
    mailer: Arc<dyn Mailer>,
}

impl<R: PaymentRepository> Clone for EffectsOrchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            receipts: self.receipts.clone(),
            mailer: self.mailer.clone(),
        }
    }
}

impl<R: PaymentRepository> EffectsOrchestrator<R> {
    pub fn new(repo: Arc<R>, receipts: Arc<dyn ReceiptGenerator>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            repo,
            receipts,
            mailer,
        }
    }

    /// Fires the side effects owed for a transaction that just became
    /// terminal. Callers invoke this at most once per transaction; the
    /// storage-level transition guard is what enforces that.
    pub async fn on_terminal(&self, tx: &Transaction) {
        match tx.status {
            PaymentStatus::Success => {
                self.decrement_stock(tx).await;
                let receipt = self.render_receipt(tx).await;
                self.send_success_email(tx, receipt).await;
            }
            PaymentStatus::Failed => {
                self.send_failure_email(tx).await;
            }
            // A customer-driven abort owes the customer nothing.
            PaymentStatus::Cancelled => {}
            PaymentStatus::Pending | PaymentStatus::Processing => {
                tracing::error!(
                    "Effects requested for non-terminal transaction {} in {}",
                    tx.reference,
                    tx.status
                );
            }
        }
    }

    async fn decrement_stock(&self, tx: &Transaction) {
        let link = match self.repo.find_link(&LinkRef::Id(tx.link_id)).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                tracing::warn!("Link {} gone, skipping stock decrement", tx.link_id);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to load link for stock decrement: {}", e);
                return;
            }
        };

        let Some(product) = link.product else {
            return;
        };

        match self.repo.decrement_stock(product.id).await {
            Ok(true) => {
                tracing::info!("Decremented stock for product {}", product.id);
            }
            Ok(false) => {
                // Sold out between validation and settlement, or unlimited.
                tracing::warn!(
                    "Stock not decremented for product {} (transaction {})",
                    product.id,
                    tx.reference
                );
            }
            Err(e) => {
                tracing::warn!("Stock decrement failed for product {}: {}", product.id, e);
            }
        }
    }

    async fn render_receipt(&self, tx: &Transaction) -> Option<Receipt> {
        match self.receipts.generate(tx).await {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                tracing::warn!("Receipt generation failed for {}: {}", tx.reference, e);
                None
            }
        }
    }

    async fn send_success_email(&self, tx: &Transaction, attachment: Option<Receipt>) {
        let Some(to) = tx.customer_email.clone() else {
            return;
        };

        let message = EmailMessage {
            to,
            subject: format!("Payment confirmed - {}", tx.reference),
            body: format!(
                "Hello {},\n\nYour payment of {} was received. Reference: {}.\n\nThank you.",
                tx.customer_name, tx.amount, tx.reference
            ),
            attachment,
        };

        if let Err(e) = self.mailer.send(message).await {
            tracing::warn!("Confirmation email failed for {}: {}", tx.reference, e);
        }
    }

    async fn send_failure_email(&self, tx: &Transaction) {
        let Some(to) = tx.customer_email.clone() else {
            return;
        };

        let reason = tx
            .failure_reason
            .clone()
            .unwrap_or_else(|| "The payment could not be completed".into());

        let message = EmailMessage {
            to,
            subject: format!("Payment failed - {}", tx.reference),
            body: format!(
                "Hello {},\n\nYour payment attempt {} did not go through: {}.\n\nYou can try again at any time.",
                tx.customer_name, tx.reference, reason
            ),
            attachment: None,
        };

        if let Err(e) = self.mailer.send(message).await {
            tracing::warn!("Failure email failed for {}: {}", tx.reference, e);
        }
    }
}

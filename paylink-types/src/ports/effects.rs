//! Ports for terminal side-effect collaborators: receipts and mail.
//!
//! Rendering and delivery mechanics live outside this system; these traits
//! are the full extent of the contract.

use crate::domain::Transaction;
use crate::error::EffectError;

/// A rendered receipt document.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// An outbound customer notification.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Receipt>,
}

#[async_trait::async_trait]
pub trait ReceiptGenerator: Send + Sync + 'static {
    /// Renders a receipt for a successful transaction.
    async fn generate(&self, tx: &Transaction) -> Result<Receipt, EffectError>;
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Sends one notification email.
    async fn send(&self, message: EmailMessage) -> Result<(), EffectError>;
}

//! Domain models for the payment link service.

pub mod link;
pub mod money;
pub mod phone;
pub mod transaction;

pub use link::{LinkId, LinkedProduct, PaymentLink, ProductId, UNLIMITED_STOCK};
pub use money::{Currency, Money};
pub use phone::PhoneNumber;
pub use transaction::{Carrier, ExternalReference, PaymentStatus, Transaction, TransactionId};

//! Port traits implemented by outbound adapters.

pub mod effects;
pub mod kv;
pub mod provider;
pub mod repository;

pub use effects::{EmailMessage, Mailer, Receipt, ReceiptGenerator};
pub use kv::KvStore;
pub use provider::{
    ApiLogEntry, ProviderAcceptance, ProviderClient, ProviderInitiateRequest, ProviderStatusView,
};
pub use repository::{PaymentRepository, StatusTransition};

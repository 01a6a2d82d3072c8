//! # PayLink Types
//!
//! Domain types and port traits for the payment link collection service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, PaymentLink, Transaction)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Carrier, Currency, ExternalReference, LinkId, LinkedProduct, Money, PaymentLink,
    PaymentStatus, PhoneNumber, ProductId, Transaction, TransactionId, UNLIMITED_STOCK,
};
pub use dto::*;
pub use error::{AppError, DomainError, EffectError, ProviderError, RepoError};
pub use ports::{
    ApiLogEntry, EmailMessage, KvStore, Mailer, PaymentRepository, ProviderAcceptance,
    ProviderClient, ProviderInitiateRequest, ProviderStatusView, Receipt, ReceiptGenerator,
    StatusTransition,
};

//! # PayLink Hex
//!
//! Application services and the inbound HTTP adapter for the payment link
//! transaction service. Orchestrates the domain through the ports defined
//! in `paylink-types`; contains no storage or provider mechanics of its own.

pub mod effects;
pub mod idempotency;
pub mod inbound;
pub mod openapi;
pub mod service;
pub mod webhook;


pub use effects::EffectsOrchestrator;
pub use idempotency::{IdempotencyCheck, IdempotencyGate};
pub use inbound::server::HttpServer;
pub use service::PaymentService;
pub use webhook::WebhookService;

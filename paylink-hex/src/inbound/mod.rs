//! Inbound adapters (HTTP).

pub mod auth;
pub mod handlers;
pub mod server;

// Solvik Identity Core
//
// Backend for the multi-tenant Solvik platform: phone-number identity
// with encryption at rest, OTP challenges over WhatsApp and email,
// member sessions, two-factor admin elevation, and host-based tenant
// routing.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;

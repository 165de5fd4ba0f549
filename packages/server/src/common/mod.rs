// Common types and utilities shared across the application

pub mod errors;
pub mod phone;

pub use errors::AuthError;
pub use phone::normalize_phone;

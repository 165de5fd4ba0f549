pub mod admin_auth;
pub mod auth;
pub mod health;
pub mod tenant_site;

pub use admin_auth::admin_auth_handler;
pub use auth::{send_otp_handler, signup_handler, verify_otp_handler, verify_signup_handler};
pub use health::health_handler;
pub use tenant_site::tenant_site_handler;

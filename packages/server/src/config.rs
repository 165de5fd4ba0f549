use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Apex domain tenant subdomains hang off, e.g. "solvik.app"
    pub base_domain: String,
    /// 64-character hex string (AES-256 key) for the identity store
    pub encryption_key: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub admin_whatsapp_number: String,
    pub admin_email_address: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,
    pub resend_api_key: String,
    pub resend_from_address: String,
    pub cloudflare_api_token: String,
    pub cloudflare_zone_id: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            base_domain: env::var("BASE_DOMAIN")
                .unwrap_or_else(|_| "solvik.app".to_string()),
            encryption_key: env::var("ENCRYPTION_KEY")
                .context("ENCRYPTION_KEY must be set")?,
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "solvik".to_string()),
            admin_whatsapp_number: env::var("ADMIN_WHATSAPP_NUMBER")
                .context("ADMIN_WHATSAPP_NUMBER must be set")?,
            admin_email_address: env::var("ADMIN_EMAIL_ADDRESS")
                .context("ADMIN_EMAIL_ADDRESS must be set")?,
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER")
                .context("TWILIO_WHATSAPP_NUMBER must be set")?,
            resend_api_key: env::var("RESEND_API_KEY")
                .context("RESEND_API_KEY must be set")?,
            resend_from_address: env::var("RESEND_FROM_ADDRESS")
                .unwrap_or_else(|_| "no-reply@solvik.app".to_string()),
            cloudflare_api_token: env::var("CLOUDFLARE_API_TOKEN")
                .context("CLOUDFLARE_API_TOKEN must be set")?,
            cloudflare_zone_id: env::var("CLOUDFLARE_ZONE_ID")
                .context("CLOUDFLARE_ZONE_ID must be set")?,
        })
    }
}

use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims - data stored in the member session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,         // Subject (account_id as string)
    pub account_id: Uuid,    // Account UUID
    pub tenant_slug: String, // Routing key for the account's site
    pub exp: i64,            // Expiration timestamp
    pub iat: i64,            // Issued at timestamp
    pub iss: String,         // Issuer
    pub jti: String,         // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies member session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a session token for an account
    ///
    /// Token expires after 12 hours
    pub fn create_token(&self, account_id: Uuid, tenant_slug: String) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(12);

        let claims = Claims {
            sub: account_id.to_string(),
            account_id,
            tenant_slug,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a session token
    ///
    /// Returns claims if the token is valid and not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "solvik".to_string());
        let account_id = Uuid::new_v4();

        let token = service.create_token(account_id, "acme".to_string()).unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.account_id, account_id);
        assert_eq!(claims.tenant_slug, "acme");
        assert_eq!(claims.iss, "solvik");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "solvik".to_string());
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "solvik".to_string());
        let service2 = JwtService::new("secret2", "solvik".to_string());

        let token = service1
            .create_token(Uuid::new_v4(), "acme".to_string())
            .unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_expires_in_twelve_hours() {
        let service = JwtService::new("test_secret_key", "solvik".to_string());
        let token = service
            .create_token(Uuid::new_v4(), "acme".to_string())
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;
        assert!(expires_in > 11 * 3600);
        assert!(expires_in <= 12 * 3600);
    }
}

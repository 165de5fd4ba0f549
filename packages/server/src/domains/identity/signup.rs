//! Tenant signup and OTP sign-in.
//!
//! Signup creates an inactive account, provisions the tenant
//! subdomain, and sends the first verification code. The account is
//! activated by the first successful verification. Sign-in resolves
//! the phone number through the encrypted-identity scan and mints a
//! session token on success.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::common::{normalize_phone, AuthError};
use crate::domains::identity::challenges::ChallengeService;
use crate::domains::identity::cipher::CipherStore;
use crate::domains::identity::jwt::JwtService;
use crate::domains::identity::models::{Account, Channel, NewAccount};
use crate::domains::identity::resolver::IdentityResolver;
use crate::kernel::{BaseDnsProvisioner, BaseIdentityStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub whatsapp_number: String,
    pub email: Option<String>,
    pub tenant_slug: String,
}

impl SignupRequest {
    /// Field validation mirroring the public signup form: names 1-100
    /// chars, phone 10-15 digits once normalized, slug 3-50 chars of
    /// `[a-z0-9]`.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.first_name.is_empty() || self.first_name.len() > 100 {
            return Err(AuthError::InvalidInput("first name".to_string()));
        }
        if self.last_name.is_empty() || self.last_name.len() > 100 {
            return Err(AuthError::InvalidInput("last name".to_string()));
        }

        let digits = normalize_phone(&self.whatsapp_number);
        let digit_count = digits.chars().filter(|c| c.is_ascii_digit()).count();
        if !(10..=15).contains(&digit_count) {
            return Err(AuthError::InvalidInput("whatsapp number".to_string()));
        }

        if !(3..=50).contains(&self.tenant_slug.len())
            || !self
                .tenant_slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(AuthError::InvalidInput("site name".to_string()));
        }

        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(AuthError::InvalidInput("email".to_string()));
            }
        }

        Ok(())
    }
}

pub struct AuthFlow {
    store: Arc<dyn BaseIdentityStore>,
    cipher: Arc<CipherStore>,
    resolver: Arc<IdentityResolver>,
    challenges: Arc<ChallengeService>,
    dns: Arc<dyn BaseDnsProvisioner>,
    jwt: Arc<JwtService>,
}

impl AuthFlow {
    pub fn new(
        store: Arc<dyn BaseIdentityStore>,
        cipher: Arc<CipherStore>,
        resolver: Arc<IdentityResolver>,
        challenges: Arc<ChallengeService>,
        dns: Arc<dyn BaseDnsProvisioner>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            store,
            cipher,
            resolver,
            challenges,
            dns,
            jwt,
        }
    }

    /// Create an inactive account and send the first verification
    /// code. If the code cannot be delivered the account is deleted
    /// again - an unreachable number must not squat a slug.
    pub async fn signup(&self, request: SignupRequest) -> Result<Account, AuthError> {
        request.validate()?;

        let normalized = normalize_phone(&request.whatsapp_number);

        if self
            .store
            .find_account_by_slug(&request.tenant_slug)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateSlug);
        }

        self.resolver.assert_identity_available(&normalized).await?;

        let encrypted_identity = self
            .cipher
            .encrypt(&normalized)
            .map_err(|e| AuthError::Internal(e.into()))?;

        let account = self
            .store
            .create_account(NewAccount {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                encrypted_identity,
                tenant_slug: request.tenant_slug.clone(),
            })
            .await?;

        // Public DNS lagging behind is tolerable; the tenant site stays
        // reachable through internal routing either way.
        if let Err(e) = self.dns.provision_tenant_host(&request.tenant_slug).await {
            tracing::warn!(slug = %request.tenant_slug, error = %e, "tenant DNS provisioning failed");
        }

        if let Err(e) = self
            .challenges
            .issue(account.id, Channel::Whatsapp, &normalized)
            .await
        {
            tracing::warn!(account_id = %account.id, "rolling back signup after issue failure");
            self.store.delete_account(account.id).await?;
            return Err(e);
        }

        tracing::info!(account_id = %account.id, slug = %account.tenant_slug, "account created");
        Ok(account)
    }

    /// Verify the signup code and activate the account.
    pub async fn verify_signup(&self, account_id: Uuid, code: &str) -> Result<(), AuthError> {
        if !self
            .challenges
            .verify(account_id, code, Channel::Whatsapp)
            .await?
        {
            return Err(AuthError::InvalidChallenge);
        }

        self.store.set_account_active(account_id, true).await?;
        tracing::info!(%account_id, "account activated");
        Ok(())
    }

    /// Sign-in step 1: resolve the phone number and send a code.
    pub async fn send_otp(&self, phone: &str) -> Result<(), AuthError> {
        let normalized = normalize_phone(phone);
        let account = self.resolver.find_by_identity(&normalized).await?;
        self.challenges
            .issue(account.id, Channel::Whatsapp, &normalized)
            .await
    }

    /// Sign-in step 2: verify the code and mint a session token.
    ///
    /// An unknown phone number collapses into the same
    /// `InvalidChallenge` as a wrong code - verification must not leak
    /// which part failed. The first successful verification also
    /// activates a not-yet-active account.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<String, AuthError> {
        let account = match self.resolver.find_by_identity(phone).await {
            Ok(account) => account,
            Err(AuthError::NotFound) => return Err(AuthError::InvalidChallenge),
            Err(e) => return Err(e),
        };

        if !self
            .challenges
            .verify(account.id, code, Channel::Whatsapp)
            .await?
        {
            return Err(AuthError::InvalidChallenge);
        }

        if !account.is_active {
            self.store.set_account_active(account.id, true).await?;
        }

        self.jwt
            .create_token(account.id, account.tenant_slug)
            .map_err(AuthError::Internal)
    }
}

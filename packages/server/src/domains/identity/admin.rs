//! Two-factor operator login.
//!
//! A single configured operator signs in by proving control of the
//! admin WhatsApp number, then the admin email, in sequence. The
//! session token is the only thing carried between steps; contact
//! points never leave configuration. Each step is gated by the
//! previous one, so compromising one channel is never enough.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::common::{normalize_phone, AuthError};
use crate::domains::identity::challenges::ChallengeService;
use crate::domains::identity::cipher::CipherStore;
use crate::domains::identity::models::{AdminSession, Channel, NewAdminSession};
use crate::kernel::BaseIdentityStore;

/// Session lifetime for an admin login attempt.
pub const ADMIN_SESSION_HOURS: i64 = 12;

/// The configured administrator contact points, passed in explicitly
/// rather than read from ambient environment state.
#[derive(Debug, Clone)]
pub struct AdminPolicy {
    pub whatsapp_number: String,
    pub email: String,
}

impl AdminPolicy {
    pub fn new(whatsapp_number: String, email: String) -> Self {
        Self {
            whatsapp_number: normalize_phone(&whatsapp_number),
            email,
        }
    }

    fn matches_number(&self, candidate: &str) -> bool {
        normalize_phone(candidate) == self.whatsapp_number
    }

    fn matches_email(&self, candidate: &str) -> bool {
        self.email.eq_ignore_ascii_case(candidate)
    }
}

pub struct AdminAuthService {
    store: Arc<dyn BaseIdentityStore>,
    challenges: Arc<ChallengeService>,
    cipher: Arc<CipherStore>,
    policy: AdminPolicy,
}

impl AdminAuthService {
    pub fn new(
        store: Arc<dyn BaseIdentityStore>,
        challenges: Arc<ChallengeService>,
        cipher: Arc<CipherStore>,
        policy: AdminPolicy,
    ) -> Self {
        Self {
            store,
            challenges,
            cipher,
            policy,
        }
    }

    /// Look up a session that exists and has not expired.
    async fn live_session(&self, token: &str) -> Result<AdminSession, AuthError> {
        let session = self
            .store
            .find_admin_session(token)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if session.is_expired(Utc::now()) {
            return Err(AuthError::Unauthorized);
        }
        Ok(session)
    }

    /// Step 1: open a session and send the WhatsApp code.
    ///
    /// Rejects any number other than the configured contact; the
    /// rejection is a plain authorization failure with no hint of how
    /// close the input was.
    pub async fn start(
        &self,
        whatsapp_number: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<String, AuthError> {
        if !self.policy.matches_number(whatsapp_number) {
            tracing::warn!(ip = ip_address, "admin login attempt with unrecognized number");
            return Err(AuthError::Unauthorized);
        }

        let token = self.cipher.generate_token();
        let session = self
            .store
            .create_admin_session(NewAdminSession {
                token: token.clone(),
                ip_address: ip_address.to_string(),
                user_agent: user_agent.to_string(),
                expires_at: Utc::now() + Duration::hours(ADMIN_SESSION_HOURS),
            })
            .await?;

        self.challenges
            .issue(session.id, Channel::Whatsapp, &self.policy.whatsapp_number)
            .await?;

        tracing::info!(session_id = %session.id, "admin session opened, WhatsApp code sent");
        Ok(token)
    }

    /// Verify the WhatsApp code, setting only `whatsapp_verified`.
    /// Gates the email step.
    pub async fn verify_whatsapp(&self, token: &str, code: &str) -> Result<(), AuthError> {
        let session = self.live_session(token).await?;

        if !self
            .challenges
            .verify(session.id, code, Channel::Whatsapp)
            .await?
        {
            return Err(AuthError::InvalidChallenge);
        }

        self.store
            .update_admin_session_flags(token, true, session.email_verified)
            .await?;
        Ok(())
    }

    /// Step 2: send the email code. Requires a live session with the
    /// WhatsApp leg already proven, and the configured admin email.
    pub async fn add_email(&self, token: &str, email: &str) -> Result<(), AuthError> {
        let session = self.live_session(token).await?;
        if !session.whatsapp_verified {
            return Err(AuthError::Unauthorized);
        }

        if !self.policy.matches_email(email) {
            tracing::warn!(session_id = %session.id, "admin login attempt with unrecognized email");
            return Err(AuthError::Unauthorized);
        }

        self.challenges
            .issue(session.id, Channel::Email, &self.policy.email)
            .await?;
        Ok(())
    }

    /// Step 3: prove both factors and elevate.
    ///
    /// The WhatsApp leg counts if it was verified earlier in the flow
    /// or if a valid code is presented now; the email code must verify
    /// in this call. Both flags flip together in one store update.
    /// Partial success sets nothing.
    pub async fn complete(
        &self,
        token: &str,
        whatsapp_code: &str,
        email_code: &str,
    ) -> Result<String, AuthError> {
        let session = self.live_session(token).await?;

        // Evaluate both legs before deciding; no early exit that would
        // let a caller distinguish which factor failed.
        let whatsapp_ok = if session.whatsapp_verified {
            true
        } else {
            self.challenges
                .verify(session.id, whatsapp_code, Channel::Whatsapp)
                .await?
        };
        let email_ok = self
            .challenges
            .verify(session.id, email_code, Channel::Email)
            .await?;

        if !(whatsapp_ok && email_ok) {
            return Err(AuthError::InvalidChallenge);
        }

        self.store
            .update_admin_session_flags(token, true, true)
            .await?;

        tracing::info!(session_id = %session.id, "admin session fully verified");
        Ok(session.token)
    }

    /// Authorization check for privileged endpoints: the token must
    /// belong to a live, fully verified session.
    pub async fn require_elevated(&self, token: &str) -> Result<AdminSession, AuthError> {
        let session = self.live_session(token).await?;
        if !session.is_fully_verified() {
            return Err(AuthError::Unauthorized);
        }
        Ok(session)
    }
}

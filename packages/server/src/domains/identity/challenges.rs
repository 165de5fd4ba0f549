//! Challenge issuance and verification.
//!
//! A challenge is a 6-digit code bound to (subject, channel), valid
//! for 10 minutes, single-use. Issuance is rate limited per subject
//! and channel over a trailing 60-minute window.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::common::AuthError;
use crate::domains::identity::cipher::CipherStore;
use crate::domains::identity::models::Channel;
use crate::kernel::{BaseDeliveryGateway, BaseIdentityStore};

/// Trailing window for the issuance rate limit.
pub const RATE_WINDOW_MINUTES: i64 = 60;

/// Maximum challenges issued per (subject, channel) within the window.
pub const MAX_CHALLENGES_PER_WINDOW: i64 = 5;

/// Lifetime of an issued code.
pub const CHALLENGE_TTL_MINUTES: i64 = 10;

pub struct ChallengeService {
    store: Arc<dyn BaseIdentityStore>,
    cipher: Arc<CipherStore>,
    delivery: Arc<dyn BaseDeliveryGateway>,
}

impl ChallengeService {
    pub fn new(
        store: Arc<dyn BaseIdentityStore>,
        cipher: Arc<CipherStore>,
        delivery: Arc<dyn BaseDeliveryGateway>,
    ) -> Self {
        Self {
            store,
            cipher,
            delivery,
        }
    }

    /// Issue a challenge for `subject` and deliver it to
    /// `delivery_address` over `channel`.
    ///
    /// Rate-limit refusal happens before any side effect. If delivery
    /// fails the challenge row is intentionally left behind (it simply
    /// expires unused) and `DeliveryFailed` tells the caller to roll
    /// back any dependent state.
    pub async fn issue(
        &self,
        subject: Uuid,
        channel: Channel,
        delivery_address: &str,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        let window_start = now - Duration::minutes(RATE_WINDOW_MINUTES);

        let recent = self
            .store
            .count_recent_challenges(subject, channel, window_start)
            .await?;
        if recent >= MAX_CHALLENGES_PER_WINDOW {
            tracing::warn!(%subject, channel = channel.as_str(), "challenge issuance rate limited");
            return Err(AuthError::RateLimited);
        }

        let code = self.cipher.generate_code();
        let expires_at = now + Duration::minutes(CHALLENGE_TTL_MINUTES);

        self.store
            .create_challenge(subject, &code, channel, expires_at)
            .await?;

        let delivered = match channel {
            Channel::Whatsapp => self.delivery.send_whatsapp(delivery_address, &code).await,
            Channel::Email => self.delivery.send_email(delivery_address, &code).await,
        };

        if let Err(e) = delivered {
            tracing::error!(%subject, channel = channel.as_str(), error = %e, "code delivery failed");
            return Err(AuthError::DeliveryFailed);
        }

        tracing::debug!(%subject, channel = channel.as_str(), "challenge issued");
        Ok(())
    }

    /// Verify a code for `subject` on `channel`.
    ///
    /// Matches on all of subject, code, channel, unused and unexpired;
    /// on match the challenge is consumed atomically. Every miss is a
    /// plain `false` - wrong code, expired, already used and wrong
    /// channel are indistinguishable to the caller.
    pub async fn verify(
        &self,
        subject: Uuid,
        code: &str,
        channel: Channel,
    ) -> Result<bool, AuthError> {
        let now = Utc::now();

        let challenge = match self
            .store
            .find_active_challenge(subject, code, channel, now)
            .await?
        {
            Some(challenge) => challenge,
            None => return Ok(false),
        };

        // Conditional update; a concurrent verify that lost the race
        // sees false here and the code stays single-use.
        let consumed = self.store.mark_challenge_used(challenge.id).await?;
        Ok(consumed)
    }
}

// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (challenge issuance, identity resolution, admin
// elevation) lives in domain services that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseIdentityStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domains::identity::models::{
    Account, AdminSession, Challenge, Channel, NewAccount, NewAdminSession,
};

// =============================================================================
// Identity Store Trait (Infrastructure - record persistence)
// =============================================================================

/// The external record store consumed by the identity core.
///
/// Every mutation is a single atomic store operation; in particular
/// `mark_challenge_used` must be a conditional update so that two
/// concurrent verifications cannot both consume one code.
#[async_trait]
pub trait BaseIdentityStore: Send + Sync {
    async fn create_account(&self, new: NewAccount) -> Result<Account>;
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn find_account_by_slug(&self, slug: &str) -> Result<Option<Account>>;
    /// All accounts, oldest first. Input to the resolver's linear scan.
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn set_account_active(&self, id: Uuid, is_active: bool) -> Result<()>;
    /// Hard delete; only used as signup rollback on delivery failure.
    async fn delete_account(&self, id: Uuid) -> Result<()>;

    async fn create_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        expires_at: DateTime<Utc>,
    ) -> Result<Challenge>;
    /// The unused, unexpired challenge matching subject + code + channel.
    async fn find_active_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>>;
    /// Returns false if the challenge was already consumed.
    async fn mark_challenge_used(&self, id: Uuid) -> Result<bool>;
    async fn count_recent_challenges(
        &self,
        subject_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    async fn create_admin_session(&self, new: NewAdminSession) -> Result<AdminSession>;
    async fn find_admin_session(&self, token: &str) -> Result<Option<AdminSession>>;
    async fn update_admin_session_flags(
        &self,
        token: &str,
        whatsapp_verified: bool,
        email_verified: bool,
    ) -> Result<()>;
}

// =============================================================================
// Delivery Gateway Trait (Infrastructure - outbound OTP delivery)
// =============================================================================

/// Fire-and-forget delivery of verification codes. Implementations
/// must bound each call with a timeout; a hung provider surfaces as an
/// error here and becomes `DeliveryFailed` in the service layer.
#[async_trait]
pub trait BaseDeliveryGateway: Send + Sync {
    /// Send a verification code over WhatsApp.
    async fn send_whatsapp(&self, number: &str, code: &str) -> Result<()>;

    /// Send a verification code over email.
    async fn send_email(&self, address: &str, code: &str) -> Result<()>;
}

// =============================================================================
// DNS Provisioner Trait (Infrastructure - tenant subdomains)
// =============================================================================

#[async_trait]
pub trait BaseDnsProvisioner: Send + Sync {
    /// Create the public DNS record for `{slug}.{base_domain}`.
    /// Called once at signup; failure is logged, never rolled back.
    async fn provision_tenant_host(&self, slug: &str) -> Result<()>;
}

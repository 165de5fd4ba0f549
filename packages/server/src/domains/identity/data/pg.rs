//! Postgres-backed identity store.
//!
//! Thin delegation to the model query functions; the trait exists so
//! services can run against the in-memory store in tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::identity::models::{
    Account, AdminSession, Challenge, Channel, NewAccount, NewAdminSession,
};
use crate::kernel::BaseIdentityStore;

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseIdentityStore for PgIdentityStore {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        Account::create(&new, &self.pool).await
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Account::find_by_id(id, &self.pool).await
    }

    async fn find_account_by_slug(&self, slug: &str) -> Result<Option<Account>> {
        Account::find_by_slug(slug, &self.pool).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Account::list_all(&self.pool).await
    }

    async fn set_account_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        Account::set_active(id, is_active, &self.pool).await
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        Account::delete(id, &self.pool).await
    }

    async fn create_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        expires_at: DateTime<Utc>,
    ) -> Result<Challenge> {
        Challenge::create(subject_id, code, channel, expires_at, &self.pool).await
    }

    async fn find_active_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>> {
        Challenge::find_active(subject_id, code, channel, now, &self.pool).await
    }

    async fn mark_challenge_used(&self, id: Uuid) -> Result<bool> {
        Challenge::mark_used(id, &self.pool).await
    }

    async fn count_recent_challenges(
        &self,
        subject_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Challenge::count_recent(subject_id, channel, since, &self.pool).await
    }

    async fn create_admin_session(&self, new: NewAdminSession) -> Result<AdminSession> {
        AdminSession::create(&new, &self.pool).await
    }

    async fn find_admin_session(&self, token: &str) -> Result<Option<AdminSession>> {
        AdminSession::find_by_token(token, &self.pool).await
    }

    async fn update_admin_session_flags(
        &self,
        token: &str,
        whatsapp_verified: bool,
        email_verified: bool,
    ) -> Result<()> {
        AdminSession::set_verified_flags(token, whatsapp_verified, email_verified, &self.pool)
            .await
    }
}

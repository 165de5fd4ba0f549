// TestDependencies - mock implementations for testing
//
// Provides an in-memory identity store plus recording mocks for the
// delivery gateway and DNS provisioner. Used by unit tests and the
// integration tests under tests/.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{BaseDeliveryGateway, BaseDnsProvisioner, BaseIdentityStore};
use crate::domains::identity::models::{
    Account, AdminSession, Challenge, Channel, NewAccount, NewAdminSession,
};

// =============================================================================
// In-memory Identity Store
// =============================================================================

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    challenges: Vec<Challenge>,
    admin_sessions: HashMap<String, AdminSession>,
}

/// HashMap-backed store with the same atomicity guarantees the real
/// store provides (mark-used is conditional under the lock).
#[derive(Default)]
pub struct MemoryIdentityStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account row directly, bypassing signup. Lets tests
    /// seed corrupt `encrypted_identity` values the resolver must skip.
    pub fn insert_account_raw(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    /// Insert a challenge row directly, e.g. one that is already
    /// expired, to simulate clock skips.
    pub fn insert_challenge_raw(&self, challenge: Challenge) {
        self.state.lock().unwrap().challenges.push(challenge);
    }

    pub fn challenge_count(&self) -> usize {
        self.state.lock().unwrap().challenges.len()
    }

    /// The most recently created challenge for a subject + channel.
    pub fn latest_challenge(&self, subject_id: Uuid, channel: Channel) -> Option<Challenge> {
        self.state
            .lock()
            .unwrap()
            .challenges
            .iter()
            .filter(|c| c.subject_id == subject_id && c.channel == channel)
            .max_by_key(|c| c.created_at)
            .cloned()
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }
}

#[async_trait]
impl BaseIdentityStore for MemoryIdentityStore {
    async fn create_account(&self, new: NewAccount) -> Result<Account> {
        let account = Account {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            encrypted_identity: new.encrypted_identity,
            tenant_slug: new.tenant_slug,
            is_active: false,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_account_by_slug(&self, slug: &str) -> Result<Option<Account>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.tenant_slug == slug)
            .cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn set_account_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == id) {
            account.is_active = is_active;
        }
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        self.state.lock().unwrap().accounts.retain(|a| a.id != id);
        Ok(())
    }

    async fn create_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        expires_at: DateTime<Utc>,
    ) -> Result<Challenge> {
        let challenge = Challenge {
            id: Uuid::new_v4(),
            subject_id,
            code: code.to_string(),
            channel,
            expires_at,
            used: false,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .challenges
            .push(challenge.clone());
        Ok(challenge)
    }

    async fn find_active_challenge(
        &self,
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> Result<Option<Challenge>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .challenges
            .iter()
            .filter(|c| {
                c.subject_id == subject_id
                    && c.code == code
                    && c.channel == channel
                    && !c.used
                    && c.expires_at > now
            })
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn mark_challenge_used(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.challenges.iter_mut().find(|c| c.id == id && !c.used) {
            Some(challenge) => {
                challenge.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_recent_challenges(
        &self,
        subject_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .challenges
            .iter()
            .filter(|c| {
                c.subject_id == subject_id && c.channel == channel && c.created_at >= since
            })
            .count() as i64)
    }

    async fn create_admin_session(&self, new: NewAdminSession) -> Result<AdminSession> {
        let session = AdminSession {
            id: Uuid::new_v4(),
            token: new.token.clone(),
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            whatsapp_verified: false,
            email_verified: false,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .admin_sessions
            .insert(new.token, session.clone());
        Ok(session)
    }

    async fn find_admin_session(&self, token: &str) -> Result<Option<AdminSession>> {
        Ok(self.state.lock().unwrap().admin_sessions.get(token).cloned())
    }

    async fn update_admin_session_flags(
        &self,
        token: &str,
        whatsapp_verified: bool,
        email_verified: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.admin_sessions.get_mut(token) {
            session.whatsapp_verified = whatsapp_verified;
            session.email_verified = email_verified;
        }
        Ok(())
    }
}

// =============================================================================
// Mock Delivery Gateway
// =============================================================================

/// A delivery call captured by the mock.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel: Channel,
    pub recipient: String,
    pub code: String,
}

pub struct MockDeliveryGateway {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockDeliveryGateway {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent send fail until cleared.
    pub fn fail_deliveries(&self, fail: bool) {
        *self.fail_next.lock().unwrap() = fail;
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The code most recently delivered to `recipient`, if any.
    pub fn last_code_for(&self, recipient: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.recipient == recipient)
            .map(|m| m.code.clone())
    }

    fn record(&self, channel: Channel, recipient: &str, code: &str) -> Result<()> {
        if *self.fail_next.lock().unwrap() {
            anyhow::bail!("mock delivery failure");
        }
        self.sent.lock().unwrap().push(SentMessage {
            channel,
            recipient: recipient.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}

impl Default for MockDeliveryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseDeliveryGateway for MockDeliveryGateway {
    async fn send_whatsapp(&self, number: &str, code: &str) -> Result<()> {
        self.record(Channel::Whatsapp, number, code)
    }

    async fn send_email(&self, address: &str, code: &str) -> Result<()> {
        self.record(Channel::Email, address, code)
    }
}

// =============================================================================
// Mock DNS Provisioner
// =============================================================================

pub struct MockDnsProvisioner {
    provisioned: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockDnsProvisioner {
    pub fn new() -> Self {
        Self {
            provisioned: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    pub fn fail_provisioning(&self, fail: bool) {
        *self.fail_next.lock().unwrap() = fail;
    }

    pub fn provisioned_slugs(&self) -> Vec<String> {
        self.provisioned.lock().unwrap().clone()
    }
}

impl Default for MockDnsProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseDnsProvisioner for MockDnsProvisioner {
    async fn provision_tenant_host(&self, slug: &str) -> Result<()> {
        if *self.fail_next.lock().unwrap() {
            anyhow::bail!("mock DNS failure");
        }
        self.provisioned.lock().unwrap().push(slug.to_string());
        Ok(())
    }
}

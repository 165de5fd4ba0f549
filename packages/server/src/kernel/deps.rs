//! Server dependencies for domain services (using traits for testability)
//!
//! This module provides the central dependency container and the
//! adapters that wrap the concrete messaging clients behind the
//! infrastructure traits.

use anyhow::Result;
use async_trait::async_trait;
use messaging::{CloudflareService, ResendService, TwilioService};
use std::sync::Arc;

use crate::domains::identity::admin::AdminPolicy;
use crate::domains::identity::cipher::CipherStore;
use crate::domains::identity::jwt::JwtService;
use crate::kernel::{BaseDeliveryGateway, BaseDnsProvisioner, BaseIdentityStore};

// =============================================================================
// Delivery Adapter (implements BaseDeliveryGateway trait)
// =============================================================================

/// Routes WhatsApp codes through Twilio and email codes through Resend.
pub struct DeliveryAdapter {
    twilio: Arc<TwilioService>,
    resend: Arc<ResendService>,
}

impl DeliveryAdapter {
    pub fn new(twilio: Arc<TwilioService>, resend: Arc<ResendService>) -> Self {
        Self { twilio, resend }
    }
}

#[async_trait]
impl BaseDeliveryGateway for DeliveryAdapter {
    async fn send_whatsapp(&self, number: &str, code: &str) -> Result<()> {
        self.twilio
            .send_whatsapp(number, code)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn send_email(&self, address: &str, code: &str) -> Result<()> {
        self.resend
            .send_code(address, code)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// Cloudflare Adapter (implements BaseDnsProvisioner trait)
// =============================================================================

pub struct CloudflareAdapter(pub Arc<CloudflareService>);

impl CloudflareAdapter {
    pub fn new(service: Arc<CloudflareService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseDnsProvisioner for CloudflareAdapter {
    async fn provision_tenant_host(&self, slug: &str) -> Result<()> {
        self.0
            .create_subdomain(slug)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain services
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseIdentityStore>,
    pub delivery: Arc<dyn BaseDeliveryGateway>,
    pub dns: Arc<dyn BaseDnsProvisioner>,
    pub cipher: Arc<CipherStore>,
    /// JWT service for member session tokens
    pub jwt_service: Arc<JwtService>,
    /// Configured admin contact points (explicit trust anchor, not env reads)
    pub admin_policy: AdminPolicy,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseIdentityStore>,
        delivery: Arc<dyn BaseDeliveryGateway>,
        dns: Arc<dyn BaseDnsProvisioner>,
        cipher: Arc<CipherStore>,
        jwt_service: Arc<JwtService>,
        admin_policy: AdminPolicy,
    ) -> Self {
        Self {
            store,
            delivery,
            dns,
            cipher,
            jwt_service,
            admin_policy,
        }
    }
}

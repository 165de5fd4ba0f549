//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use messaging::{
    CloudflareOptions, CloudflareService, ResendOptions, ResendService, TwilioOptions,
    TwilioService,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::identity::data::PgIdentityStore;
use crate::domains::identity::{
    AdminAuthService, AdminPolicy, AuthFlow, ChallengeService, CipherStore, IdentityResolver,
    JwtService,
};
use crate::kernel::{CloudflareAdapter, DeliveryAdapter, ServerDeps};
use crate::server::middleware::{session_auth_middleware, tenant_router_middleware, TenantRouter};
use crate::server::routes::{
    admin_auth_handler, health_handler, send_otp_handler, signup_handler, tenant_site_handler,
    verify_otp_handler, verify_signup_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
    pub auth_flow: Arc<AuthFlow>,
    pub admin_auth: Arc<AdminAuthService>,
}

/// Build the Axum application router
///
/// Wires the identity services over the Postgres store and the real
/// delivery gateways, then stacks the edge middleware: tenant routing
/// outermost, then tracing/CORS, shared state, rate limiting, and
/// session auth closest to the handlers.
pub fn build_app(pool: PgPool, config: &Config) -> Result<Router> {
    let cipher = Arc::new(CipherStore::from_hex(&config.encryption_key)?);

    let twilio = Arc::new(TwilioService::new(TwilioOptions {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        from_number: config.twilio_whatsapp_number.clone(),
    }));
    let resend = Arc::new(ResendService::new(ResendOptions {
        api_key: config.resend_api_key.clone(),
        from_address: config.resend_from_address.clone(),
    }));
    let cloudflare = Arc::new(CloudflareService::new(CloudflareOptions {
        api_token: config.cloudflare_api_token.clone(),
        zone_id: config.cloudflare_zone_id.clone(),
        base_domain: config.base_domain.clone(),
    }));

    let store = Arc::new(PgIdentityStore::new(pool.clone()));
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let admin_policy = AdminPolicy::new(
        config.admin_whatsapp_number.clone(),
        config.admin_email_address.clone(),
    );

    let deps = Arc::new(ServerDeps::new(
        store.clone(),
        Arc::new(DeliveryAdapter::new(twilio, resend)),
        Arc::new(CloudflareAdapter::new(cloudflare)),
        cipher,
        jwt_service.clone(),
        admin_policy,
    ));

    let resolver = Arc::new(IdentityResolver::new(
        deps.store.clone(),
        deps.cipher.clone(),
    ));
    let challenges = Arc::new(ChallengeService::new(
        deps.store.clone(),
        deps.cipher.clone(),
        deps.delivery.clone(),
    ));
    let auth_flow = Arc::new(AuthFlow::new(
        deps.store.clone(),
        deps.cipher.clone(),
        resolver,
        challenges.clone(),
        deps.dns.clone(),
        deps.jwt_service.clone(),
    ));
    let admin_auth = Arc::new(AdminAuthService::new(
        deps.store.clone(),
        challenges,
        deps.cipher.clone(),
        deps.admin_policy.clone(),
    ));

    let app_state = AppState {
        db_pool: pool,
        deps,
        auth_flow,
        admin_auth,
    };

    let tenant_router = Arc::new(TenantRouter::new(config.base_domain.clone()));

    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Rate limiting: 10 requests per second per IP with burst of 20.
    // Covers the OTP endpoints (send/verify) against abuse.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let jwt_for_middleware = jwt_service;

    let app = Router::new()
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/verify-signup", post(verify_signup_handler))
        .route("/api/auth/send-otp", post(send_otp_handler))
        .route("/api/auth/verify-otp", post(verify_otp_handler))
        .route("/api/admin/auth", post(admin_auth_handler))
        .route("/tenant-site/:slug", get(tenant_site_handler))
        .route("/tenant-site/:slug/*path", get(tenant_site_handler))
        // Health check (no rate limit concerns; responds before auth)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            session_auth_middleware(jwt_for_middleware.clone(), req, next)
        }))
        .layer(rate_limit_layer)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Tenant routing runs first so handlers see the rewritten URI
        .layer(Extension(tenant_router))
        .layer(middleware::from_fn(tenant_router_middleware));

    Ok(app)
}

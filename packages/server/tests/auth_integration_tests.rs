//! Integration tests for tenant signup and OTP sign-in.
//!
//! Exercises the full service stack over the in-memory store and the
//! recording delivery/DNS mocks:
//! - Signup creates an inactive account and sends the first code
//! - Verification activates; wrong codes are rejected
//! - Delivery failure rolls the account back
//! - DNS failure does not fail signup
//! - Rate limiting, single-use codes, and sign-in token minting

use std::sync::Arc;

use server_core::common::AuthError;
use server_core::domains::identity::models::Channel;
use server_core::domains::identity::{
    AuthFlow, ChallengeService, CipherStore, IdentityResolver, JwtService, SignupRequest,
};
use server_core::kernel::test_dependencies::{
    MemoryIdentityStore, MockDeliveryGateway, MockDnsProvisioner,
};
use server_core::kernel::{BaseDeliveryGateway, BaseDnsProvisioner, BaseIdentityStore};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestRig {
    store: Arc<MemoryIdentityStore>,
    delivery: Arc<MockDeliveryGateway>,
    dns: Arc<MockDnsProvisioner>,
    jwt: Arc<JwtService>,
    auth_flow: AuthFlow,
}

fn test_rig() -> TestRig {
    let store = Arc::new(MemoryIdentityStore::new());
    let delivery = Arc::new(MockDeliveryGateway::new());
    let dns = Arc::new(MockDnsProvisioner::new());
    let cipher = Arc::new(CipherStore::new([7u8; 32]));
    let jwt = Arc::new(JwtService::new("test_secret_key", "test_issuer".to_string()));

    let resolver = Arc::new(IdentityResolver::new(
        store.clone() as Arc<dyn BaseIdentityStore>,
        cipher.clone(),
    ));
    let challenges = Arc::new(ChallengeService::new(
        store.clone() as Arc<dyn BaseIdentityStore>,
        cipher.clone(),
        delivery.clone() as Arc<dyn BaseDeliveryGateway>,
    ));
    let auth_flow = AuthFlow::new(
        store.clone() as Arc<dyn BaseIdentityStore>,
        cipher,
        resolver,
        challenges,
        dns.clone() as Arc<dyn BaseDnsProvisioner>,
        jwt.clone(),
    );

    TestRig {
        store,
        delivery,
        dns,
        jwt,
        auth_flow,
    }
}

fn signup_request(phone: &str, slug: &str) -> SignupRequest {
    SignupRequest {
        first_name: "Maria".to_string(),
        last_name: "Gonzalez".to_string(),
        whatsapp_number: phone.to_string(),
        email: Some("maria@example.com".to_string()),
        tenant_slug: slug.to_string(),
    }
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn signup_creates_inactive_account_and_sends_code() {
    let rig = test_rig();

    let account = rig
        .auth_flow
        .signup(signup_request("+1 (555) 010-2030", "mariasalon"))
        .await
        .expect("signup should succeed");

    assert!(!account.is_active);
    assert_eq!(account.tenant_slug, "mariasalon");

    // Code goes to the normalized number over WhatsApp
    let sent = rig.delivery.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, Channel::Whatsapp);
    assert_eq!(sent[0].recipient, "+15550102030");
    assert_eq!(sent[0].code.len(), 6);
    assert!(sent[0].code.chars().all(|c| c.is_ascii_digit()));

    // Subdomain provisioned
    assert_eq!(rig.dns.provisioned_slugs(), vec!["mariasalon".to_string()]);

    // The phone number is never stored in the clear
    assert_ne!(account.encrypted_identity, "+15550102030");
}

#[tokio::test]
async fn signup_rejects_duplicate_slug() {
    let rig = test_rig();

    rig.auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("first signup should succeed");

    let err = rig
        .auth_flow
        .signup(signup_request("+15550109999", "mariasalon"))
        .await
        .expect_err("duplicate slug should be rejected");
    assert!(matches!(err, AuthError::DuplicateSlug));
}

#[tokio::test]
async fn signup_rejects_duplicate_identity_across_formats() {
    let rig = test_rig();

    rig.auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("first signup should succeed");

    // Same number in a different presentation format
    let err = rig
        .auth_flow
        .signup(signup_request("+1 555 010 2030", "othersalon"))
        .await
        .expect_err("duplicate identity should be rejected");
    assert!(matches!(err, AuthError::DuplicateIdentity));
    assert_eq!(rig.store.account_count(), 1);
}

#[tokio::test]
async fn signup_rejects_invalid_slug() {
    let rig = test_rig();

    let err = rig
        .auth_flow
        .signup(signup_request("+15550102030", "Maria's Salon"))
        .await
        .expect_err("slug with invalid characters should be rejected");
    assert!(matches!(err, AuthError::InvalidInput(_)));
    assert_eq!(rig.store.account_count(), 0);
}

#[tokio::test]
async fn signup_delivery_failure_rolls_back_account() {
    let rig = test_rig();
    rig.delivery.fail_deliveries(true);

    let err = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect_err("signup should fail when the code cannot be delivered");
    assert!(matches!(err, AuthError::DeliveryFailed));

    // An unreachable number must not squat the slug
    assert_eq!(rig.store.account_count(), 0);
}

#[tokio::test]
async fn signup_survives_dns_provisioning_failure() {
    let rig = test_rig();
    rig.dns.fail_provisioning(true);

    let account = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed despite DNS failure");

    assert_eq!(rig.store.account_count(), 1);
    assert_eq!(rig.delivery.sent_messages().len(), 1);
    assert_eq!(account.tenant_slug, "mariasalon");
}

// ============================================================================
// Signup verification
// ============================================================================

#[tokio::test]
async fn wrong_code_rejected_then_real_code_activates() {
    let rig = test_rig();

    let account = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed");

    let err = rig
        .auth_flow
        .verify_signup(account.id, "000111")
        .await
        .expect_err("wrong code should be rejected");
    assert!(matches!(err, AuthError::InvalidChallenge));

    // Wrong attempt does not consume the real code
    let code = rig
        .delivery
        .last_code_for("+15550102030")
        .expect("a code was delivered");
    rig.auth_flow
        .verify_signup(account.id, &code)
        .await
        .expect("real code should verify");

    let stored = rig
        .store
        .find_account_by_id(account.id)
        .await
        .expect("lookup should succeed")
        .expect("account exists");
    assert!(stored.is_active);
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
async fn send_otp_for_unknown_number_is_not_found() {
    let rig = test_rig();

    let err = rig
        .auth_flow
        .send_otp("+19998887777")
        .await
        .expect_err("unknown number should not get a code");
    assert!(matches!(err, AuthError::NotFound));
    assert!(rig.delivery.sent_messages().is_empty());
}

#[tokio::test]
async fn verify_otp_for_unknown_number_collapses_to_invalid_challenge() {
    let rig = test_rig();

    // Verification must not reveal whether the number exists
    let err = rig
        .auth_flow
        .verify_otp("+19998887777", "123456")
        .await
        .expect_err("unknown number should fail verification");
    assert!(matches!(err, AuthError::InvalidChallenge));
}

#[tokio::test]
async fn sign_in_mints_token_with_tenant_claims() {
    let rig = test_rig();

    let account = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed");
    let code = rig.delivery.last_code_for("+15550102030").expect("code sent");
    rig.auth_flow
        .verify_signup(account.id, &code)
        .await
        .expect("activation should succeed");

    rig.auth_flow
        .send_otp("+1 555 010 2030")
        .await
        .expect("send-otp should accept a formatted number");
    let code = rig.delivery.last_code_for("+15550102030").expect("code sent");

    let token = rig
        .auth_flow
        .verify_otp("+15550102030", &code)
        .await
        .expect("sign-in should succeed");

    let claims = rig.jwt.verify_token(&token).expect("token should verify");
    assert_eq!(claims.account_id, account.id);
    assert_eq!(claims.tenant_slug, "mariasalon");
}

#[tokio::test]
async fn sign_in_code_is_single_use() {
    let rig = test_rig();

    let account = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed");
    let code = rig.delivery.last_code_for("+15550102030").expect("code sent");
    rig.auth_flow
        .verify_signup(account.id, &code)
        .await
        .expect("activation should succeed");

    rig.auth_flow.send_otp("+15550102030").await.expect("send-otp");
    let code = rig.delivery.last_code_for("+15550102030").expect("code sent");

    rig.auth_flow
        .verify_otp("+15550102030", &code)
        .await
        .expect("first verification should succeed");

    let err = rig
        .auth_flow
        .verify_otp("+15550102030", &code)
        .await
        .expect_err("replayed code should be rejected");
    assert!(matches!(err, AuthError::InvalidChallenge));
}

#[tokio::test]
async fn first_sign_in_activates_dormant_account() {
    let rig = test_rig();

    // Signup but never verify; sign in later instead
    let account = rig
        .auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed");
    assert!(!account.is_active);

    let code = rig.delivery.last_code_for("+15550102030").expect("code sent");
    rig.auth_flow
        .verify_otp("+15550102030", &code)
        .await
        .expect("sign-in should succeed");

    let stored = rig
        .store
        .find_account_by_id(account.id)
        .await
        .expect("lookup should succeed")
        .expect("account exists");
    assert!(stored.is_active);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn sixth_code_in_window_is_rate_limited() {
    let rig = test_rig();

    // Signup issues challenge #1 for this subject + channel
    rig.auth_flow
        .signup(signup_request("+15550102030", "mariasalon"))
        .await
        .expect("signup should succeed");

    // Challenges #2-#5 still go through
    for _ in 0..4 {
        rig.auth_flow
            .send_otp("+15550102030")
            .await
            .expect("code within window should be issued");
    }

    let err = rig
        .auth_flow
        .send_otp("+15550102030")
        .await
        .expect_err("sixth code in the window should be refused");
    assert!(matches!(err, AuthError::RateLimited));

    // Refusal has no side effects
    assert_eq!(rig.store.challenge_count(), 5);
    assert_eq!(rig.delivery.sent_messages().len(), 5);
}

use std::sync::Arc;

use axum::{middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

use crate::domains::identity::JwtService;

/// Authenticated account information from a session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub tenant_slug: String,
}

/// Session authentication middleware
///
/// Extracts the bearer token from the Authorization header, verifies
/// it, and adds AuthUser to request extensions. If no token or an
/// invalid token, the request continues without AuthUser (public access).
pub async fn session_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!("Authenticated account: {}", user.account_id);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid session token");
    }

    next.run(request).await
}

/// Extract and verify the session token from a request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        account_id: claims.account_id,
        tenant_slug: claims.tenant_slug,
    })
}

// Tenant-site namespace: the target of the tenant router's rewrite.
//
// Rendering tenant content is handled by the site renderer, not this
// core; this endpoint resolves the slug to a live tenant and hands
// back the routing envelope.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use crate::common::AuthError;
use crate::server::app::AppState;

/// GET /tenant-site/:slug and GET /tenant-site/:slug/*path
pub async fn tenant_site_handler(
    Extension(state): Extension<AppState>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<Value>, AuthError> {
    let slug = params.get("slug").cloned().ok_or(AuthError::NotFound)?;

    let account = state
        .deps
        .store
        .find_account_by_slug(&slug)
        .await?
        .ok_or(AuthError::NotFound)?;

    // Unverified signups have no published site yet.
    if !account.is_active {
        return Err(AuthError::NotFound);
    }

    Ok(Json(json!({
        "tenant": account.tenant_slug,
        "owner": format!("{} {}", account.first_name, account.last_name),
    })))
}

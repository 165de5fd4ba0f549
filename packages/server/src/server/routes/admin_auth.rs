// Step-dispatched endpoint for the two-factor operator login.
//
// One POST endpoint, four steps: "whatsapp" opens a session and sends
// the first code, "whatsapp-verify" proves the WhatsApp leg, "email"
// sends the second code, "verify" proves both factors and elevates.

use axum::{
    extract::{Extension, Request},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::AuthError;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminStep {
    Whatsapp,
    WhatsappVerify,
    Email,
    Verify,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthRequest {
    pub step: AdminStep,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub whatsapp_otp: Option<String>,
    pub email_otp: Option<String>,
    pub session_token: Option<String>,
}

fn required(field: Option<String>, name: &str) -> Result<String, AuthError> {
    field.ok_or_else(|| AuthError::InvalidInput(name.to_string()))
}

/// POST /api/admin/auth
pub async fn admin_auth_handler(
    Extension(state): Extension<AppState>,
    request: Request,
) -> Result<Json<Value>, AuthError> {
    // Audit-only origin data; "unknown" when a proxy strips headers.
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let bytes = axum::body::to_bytes(request.into_body(), 64 * 1024)
        .await
        .map_err(|_| AuthError::InvalidInput("body".to_string()))?;
    let body: AdminAuthRequest = serde_json::from_slice(&bytes)
        .map_err(|_| AuthError::InvalidInput("body".to_string()))?;

    match body.step {
        AdminStep::Whatsapp => {
            let number = required(body.whatsapp_number, "whatsappNumber")?;
            let token = state
                .admin_auth
                .start(&number, &client_ip, &user_agent)
                .await?;
            Ok(Json(json!({
                "sessionToken": token,
                "message": "Code sent over WhatsApp.",
            })))
        }
        AdminStep::WhatsappVerify => {
            let token = required(body.session_token, "sessionToken")?;
            let code = required(body.whatsapp_otp, "whatsappOtp")?;
            state.admin_auth.verify_whatsapp(&token, &code).await?;
            Ok(Json(json!({ "message": "WhatsApp verified." })))
        }
        AdminStep::Email => {
            let token = required(body.session_token, "sessionToken")?;
            let email = required(body.email, "email")?;
            state.admin_auth.add_email(&token, &email).await?;
            Ok(Json(json!({ "message": "Code sent over email." })))
        }
        AdminStep::Verify => {
            let token = required(body.session_token, "sessionToken")?;
            let whatsapp_otp = body.whatsapp_otp.unwrap_or_default();
            let email_otp = required(body.email_otp, "emailOtp")?;
            let session_token = state
                .admin_auth
                .complete(&token, &whatsapp_otp, &email_otp)
                .await?;
            Ok(Json(json!({
                "message": "Authentication complete.",
                "sessionToken": session_token,
            })))
        }
    }
}

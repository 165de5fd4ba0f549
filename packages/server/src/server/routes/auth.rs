// Tenant signup and sign-in endpoints.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::AuthError;
use crate::domains::identity::SignupRequest;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignupRequest {
    pub account_id: Uuid,
    pub otp_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub whatsapp_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub whatsapp_number: String,
    pub otp_code: String,
}

/// POST /api/auth/signup
pub async fn signup_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<Value>, AuthError> {
    let account = state.auth_flow.signup(request).await?;

    Ok(Json(json!({
        "message": "Account created. Verification code sent.",
        "accountId": account.id,
    })))
}

/// POST /api/auth/verify-signup
pub async fn verify_signup_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<VerifySignupRequest>,
) -> Result<Json<Value>, AuthError> {
    state
        .auth_flow
        .verify_signup(request.account_id, &request.otp_code)
        .await?;

    Ok(Json(json!({
        "message": "Account verified and activated.",
        "success": true,
    })))
}

/// POST /api/auth/send-otp
pub async fn send_otp_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<Value>, AuthError> {
    state.auth_flow.send_otp(&request.whatsapp_number).await?;

    Ok(Json(json!({
        "message": "Verification code sent.",
    })))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, AuthError> {
    let token = state
        .auth_flow
        .verify_otp(&request.whatsapp_number, &request.otp_code)
        .await?;

    Ok(Json(json!({ "token": token })))
}

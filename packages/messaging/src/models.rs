use serde::Deserialize;

/// Response from the Twilio Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
}

/// Response from the Resend send endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailResponse {
    pub id: String,
}

/// Envelope returned by the Cloudflare v4 API.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareResponse {
    pub success: bool,
}

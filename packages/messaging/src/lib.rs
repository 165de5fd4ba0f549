// Outbound delivery clients: Twilio WhatsApp messages, Resend email,
// and Cloudflare DNS provisioning for tenant subdomains.

use std::collections::HashMap;
use std::time::Duration;

pub mod models;

use reqwest::{header, Client};

use crate::models::{CloudflareResponse, EmailResponse, MessageResponse};

/// All outbound calls are bounded; a hung gateway must surface as a
/// delivery failure, not a stuck request handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, E.164 without the `whatsapp:` prefix.
    pub from_number: String,
}

/// Client for the Twilio Messages API, used to deliver verification
/// codes over WhatsApp.
#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { options, client }
    }

    /// Send a verification code to `recipient` over WhatsApp.
    pub async fn send_whatsapp(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<MessageResponse, &'static str> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        );

        let body = format!(
            "Su código de verificación Solvik es: {code}. Válido por 10 minutos."
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/x-www-form-urlencoded"
                .parse()
                .expect("Header value should parse correctly"),
        );

        let mut form_body: HashMap<&str, String> = HashMap::new();
        form_body.insert("From", format!("whatsapp:{}", self.options.from_number));
        form_body.insert("To", format!("whatsapp:{recipient}"));
        form_body.insert("Body", body);

        let res = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .headers(headers)
            .form(&form_body)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    tracing::error!(%status, error_body, "Twilio returned an error");
                    return Err("Twilio returned an error");
                }

                match response.json::<MessageResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to parse Twilio response");
                        Err("Error parsing message response")
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Request to Twilio failed");
                Err("Error sending WhatsApp message")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResendOptions {
    pub api_key: String,
    pub from_address: String,
}

/// Client for the Resend transactional email API, used for the admin
/// email verification leg.
#[derive(Debug, Clone)]
pub struct ResendService {
    options: ResendOptions,
    client: Client,
}

impl ResendService {
    pub fn new(options: ResendOptions) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { options, client }
    }

    /// Email a verification code to `recipient`.
    pub async fn send_code(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<EmailResponse, &'static str> {
        let payload = serde_json::json!({
            "from": self.options.from_address,
            "to": [recipient],
            "subject": "Código de verificación Solvik",
            "html": format!(
                "<h2>Código de verificación</h2><p>Su código es: <strong>{code}</strong></p>"
            ),
        });

        let res = self
            .client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.options.api_key)
            .json(&payload)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    tracing::error!(%status, error_body, "Resend returned an error");
                    return Err("Resend returned an error");
                }

                match response.json::<EmailResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to parse Resend response");
                        Err("Error parsing email response")
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Request to Resend failed");
                Err("Error sending email")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudflareOptions {
    pub api_token: String,
    pub zone_id: String,
    /// Apex the tenant subdomains hang off, e.g. "solvik.app".
    pub base_domain: String,
}

/// Client for the Cloudflare DNS API. Creates one CNAME per tenant
/// slug pointing at the apex.
#[derive(Debug, Clone)]
pub struct CloudflareService {
    options: CloudflareOptions,
    client: Client,
}

impl CloudflareService {
    pub fn new(options: CloudflareOptions) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { options, client }
    }

    /// Create the `{slug}.{base_domain}` CNAME record.
    pub async fn create_subdomain(&self, slug: &str) -> Result<(), &'static str> {
        let url = format!(
            "https://api.cloudflare.com/client/v4/zones/{zone}/dns_records",
            zone = self.options.zone_id
        );

        let payload = serde_json::json!({
            "type": "CNAME",
            "name": slug,
            "content": self.options.base_domain,
            "ttl": 1,
            "proxied": true,
        });

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.options.api_token)
            .json(&payload)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    tracing::error!(%status, error_body, "Cloudflare returned an error");
                    return Err("Cloudflare returned an error");
                }

                match response.json::<CloudflareResponse>().await {
                    Ok(data) if data.success => Ok(()),
                    Ok(_) => Err("Cloudflare reported failure"),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to parse Cloudflare response");
                        Err("Error parsing Cloudflare response")
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Request to Cloudflare failed");
                Err("Error provisioning subdomain")
            }
        }
    }
}

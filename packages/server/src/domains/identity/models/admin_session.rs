use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// AdminSession - carrier for the two-factor operator login
///
/// Independent of any Account; admin auth resolves to an operator
/// trust level, not a tenant. The token is the only thing the operator
/// carries between steps. IP and user agent are audit-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminSession {
    pub id: Uuid,
    /// Opaque random token, 256 bits hex-encoded.
    pub token: String,
    pub ip_address: String,
    pub user_agent: String,
    pub whatsapp_verified: bool,
    pub email_verified: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to open an admin session.
#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub token: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_fully_verified(&self) -> bool {
        self.whatsapp_verified && self.email_verified
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl AdminSession {
    /// Open a new session with both verification flags false
    pub async fn create(new: &NewAdminSession, pool: &PgPool) -> Result<Self> {
        let session = sqlx::query_as::<_, AdminSession>(
            r#"
            INSERT INTO admin_sessions (token, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.token)
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(new.expires_at)
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    /// Find session by its bearer token
    pub async fn find_by_token(token: &str, pool: &PgPool) -> Result<Option<Self>> {
        let session =
            sqlx::query_as::<_, AdminSession>("SELECT * FROM admin_sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(pool)
                .await?;
        Ok(session)
    }

    /// Update both verification flags in one statement
    pub async fn set_verified_flags(
        token: &str,
        whatsapp_verified: bool,
        email_verified: bool,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE admin_sessions SET whatsapp_verified = $2, email_verified = $3 WHERE token = $1",
        )
        .bind(token)
        .bind(whatsapp_verified)
        .bind(email_verified)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in_hours: i64, wa: bool, em: bool) -> AdminSession {
        let now = Utc::now();
        AdminSession {
            id: Uuid::new_v4(),
            token: "token".to_string(),
            ip_address: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
            whatsapp_verified: wa,
            email_verified: em,
            expires_at: now + Duration::hours(expires_in_hours),
            created_at: now,
        }
    }

    #[test]
    fn test_expiry() {
        assert!(!session(12, false, false).is_expired(Utc::now()));
        assert!(session(-1, false, false).is_expired(Utc::now()));
    }

    #[test]
    fn test_full_verification_requires_both_flags() {
        assert!(!session(12, true, false).is_fully_verified());
        assert!(!session(12, false, true).is_fully_verified());
        assert!(session(12, true, true).is_fully_verified());
    }
}

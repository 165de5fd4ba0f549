use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account - a tenant owner on the platform
///
/// The WhatsApp number is the primary identity attribute and is only
/// ever stored encrypted. There is no plaintext phone column and no
/// index over it; lookups go through the identity resolver's
/// decrypt-and-compare scan.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    /// AES-256-GCM ciphertext of the normalized WhatsApp number.
    pub encrypted_identity: String,
    /// Globally unique subdomain label routing to this tenant's site.
    pub tenant_slug: String,
    /// False until the first OTP verification succeeds.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an account at signup.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub encrypted_identity: String,
    pub tenant_slug: String,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Account {
    /// Create an inactive account
    pub async fn create(new: &NewAccount, pool: &PgPool) -> Result<Self> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (first_name, last_name, email, encrypted_identity, tenant_slug)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.encrypted_identity)
        .bind(&new.tenant_slug)
        .fetch_one(pool)
        .await?;
        Ok(account)
    }

    /// Find account by id
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(account)
    }

    /// Find account by tenant slug
    pub async fn find_by_slug(slug: &str, pool: &PgPool) -> Result<Option<Self>> {
        let account =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE tenant_slug = $1")
                .bind(slug)
                .fetch_optional(pool)
                .await?;
        Ok(account)
    }

    /// List all accounts, oldest first.
    ///
    /// Feeds the resolver's linear decrypt-and-compare scan; ordering
    /// makes duplicate resolution deterministic.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let accounts =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at ASC")
                .fetch_all(pool)
                .await?;
        Ok(accounts)
    }

    /// Flip the activation flag
    pub async fn set_active(id: Uuid, is_active: bool, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE accounts SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Hard-delete an account (signup rollback only)
    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Delivery channel for a verification code.
///
/// Part of the challenge matching key: a code issued over WhatsApp
/// never verifies against the email channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Whatsapp,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Whatsapp => "WHATSAPP",
            Channel::Email => "EMAIL",
        }
    }
}

/// Derived lifecycle state of a challenge.
///
/// `Expired` is never stored; it is computed lazily from `expires_at`
/// when the challenge is inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Consumed,
    Expired,
}

/// Challenge - a single-use verification code bound to a subject
///
/// The subject is an account id for ordinary sign-in, or an admin
/// session id for the privileged flow.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Challenge {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub code: String,
    pub channel: Channel,
    pub expires_at: DateTime<Utc>,
    /// Monotonic false -> true; flipped exactly once on verification.
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn status_at(&self, now: DateTime<Utc>) -> ChallengeStatus {
        if self.used {
            ChallengeStatus::Consumed
        } else if now >= self.expires_at {
            ChallengeStatus::Expired
        } else {
            ChallengeStatus::Pending
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Challenge {
    /// Persist a new pending challenge
    pub async fn create(
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        expires_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"
            INSERT INTO challenges (subject_id, code, channel, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(subject_id)
        .bind(code)
        .bind(channel)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;
        Ok(challenge)
    }

    /// Find the unused, unexpired challenge matching subject + code + channel
    pub async fn find_active(
        subject_id: Uuid,
        code: &str,
        channel: Channel,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let challenge = sqlx::query_as::<_, Challenge>(
            r#"
            SELECT * FROM challenges
            WHERE subject_id = $1 AND code = $2 AND channel = $3
              AND used = FALSE AND expires_at > $4
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(subject_id)
        .bind(code)
        .bind(channel)
        .bind(now)
        .fetch_optional(pool)
        .await?;
        Ok(challenge)
    }

    /// Mark a challenge consumed. The `used = FALSE` guard makes the
    /// flip atomic under concurrent verification; returns false if
    /// another call already consumed it.
    pub async fn mark_used(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE challenges SET used = TRUE WHERE id = $1 AND used = FALSE")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Count challenges issued for subject + channel since `since`
    pub async fn count_recent(
        subject_id: Uuid,
        channel: Channel,
        since: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM challenges
            WHERE subject_id = $1 AND channel = $2 AND created_at >= $3
            "#,
        )
        .bind(subject_id)
        .bind(channel)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn challenge(used: bool, expires_in_minutes: i64) -> Challenge {
        let now = Utc::now();
        Challenge {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            code: "123456".to_string(),
            channel: Channel::Whatsapp,
            expires_at: now + Duration::minutes(expires_in_minutes),
            used,
            created_at: now,
        }
    }

    #[test]
    fn test_status_pending() {
        let ch = challenge(false, 10);
        assert_eq!(ch.status_at(Utc::now()), ChallengeStatus::Pending);
    }

    #[test]
    fn test_status_consumed_wins_over_expired() {
        let ch = challenge(true, -5);
        assert_eq!(ch.status_at(Utc::now()), ChallengeStatus::Consumed);
    }

    #[test]
    fn test_status_expired() {
        let ch = challenge(false, 10);
        let later = Utc::now() + Duration::minutes(11);
        assert_eq!(ch.status_at(later), ChallengeStatus::Expired);
    }

    #[test]
    fn test_channel_tags() {
        assert_eq!(Channel::Whatsapp.as_str(), "WHATSAPP");
        assert_eq!(Channel::Email.as_str(), "EMAIL");
    }
}

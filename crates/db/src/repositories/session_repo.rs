//! Repository for the `user_sessions` table.

use pitchcraft_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::session::{CreateSession, UserSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, session_key, expires_at, is_revoked, user_agent, created_at, updated_at";

/// Provides CRUD operations for user sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, session_key, expires_at, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(input.session_key)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Find an active session by its key.
    ///
    /// Only returns sessions that are not revoked and not expired.
    pub async fn find_active_by_key(
        pool: &PgPool,
        session_key: Uuid,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE session_key = $1
               AND is_revoked = false
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(session_key)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a session by key. Returns `true` if the row was updated.
    pub async fn revoke_by_key(pool: &PgPool, session_key: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE session_key = $1 AND is_revoked = false",
        )
        .bind(session_key)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Push an active session's expiry out to `expires_at`.
    ///
    /// Returns `false` if the session is revoked or unknown.
    pub async fn extend(
        pool: &PgPool,
        session_key: Uuid,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET expires_at = $2
             WHERE session_key = $1 AND is_revoked = false",
        )
        .bind(session_key)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired or revoked sessions. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE expires_at < NOW() OR is_revoked = true")
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

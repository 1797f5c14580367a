//! Guest session quota persistence
//!
//! One row per guest session cookie. The quota record is serialized JSON in
//! a TEXT column so the limiter's storage contract stays schema-free.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::GuestQuota;

/// Load the quota record for a session, if one exists
pub async fn load_quota(pool: &SqlitePool, session_id: Uuid) -> Result<Option<GuestQuota>> {
    let row = sqlx::query("SELECT quota FROM guest_sessions WHERE session_id = ?")
        .bind(session_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let quota: String = row.get("quota");
            let quota: GuestQuota = serde_json::from_str(&quota)
                .map_err(|e| Error::Internal(format!("Failed to deserialize quota: {}", e)))?;
            Ok(Some(quota))
        }
        None => Ok(None),
    }
}

/// Write back the session's quota state after a limiter decision.
///
/// `Some` upserts the record (refreshing `updated_at` even when the counts
/// did not change); `None` deletes it, which is how a reset lands on disk.
pub async fn store_quota(
    pool: &SqlitePool,
    session_id: Uuid,
    quota: Option<&GuestQuota>,
) -> Result<()> {
    let session_id = session_id.to_string();

    match quota {
        Some(quota) => {
            let quota = serde_json::to_string(quota)
                .map_err(|e| Error::Internal(format!("Failed to serialize quota: {}", e)))?;

            sqlx::query(
                r#"
                INSERT INTO guest_sessions (session_id, quota, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(session_id) DO UPDATE SET
                    quota = excluded.quota,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&session_id)
            .bind(&quota)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query("DELETE FROM guest_sessions WHERE session_id = ?")
                .bind(&session_id)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}

/// Count stored guest sessions (test support and admin visibility)
pub async fn count_sessions(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guest_sessions")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

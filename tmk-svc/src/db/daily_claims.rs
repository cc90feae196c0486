//! Daily free-pack claim operations
//!
//! One claim per user per UTC calendar day, enforced by the unique
//! (user_id, claim_date) key rather than a read-then-write check.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use tmk_common::Result;

/// Record today's free-pack claim for a user. Returns true when the
/// claim was granted, false when the day's claim already exists.
pub async fn try_claim(
    pool: &SqlitePool,
    user_id: &str,
    claim_date: &str,
    claimed_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO daily_claims (id, user_id, claim_date, claimed_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(claim_date)
    .bind(claimed_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

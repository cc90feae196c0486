//! Voucher collection operations
//!
//! Redemption is a conditional flip on `redeemed = 0` so a voucher can
//! be consumed exactly once no matter how many callers race on it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use tmk_common::{Error, Result};

use crate::gacha::Rarity;

/// A prize voucher won from a pack.
#[derive(Debug, Clone, Serialize)]
pub struct Voucher {
    pub id: Uuid,
    pub owner_uid: String,
    pub brand: String,
    pub amount: i64,
    pub rarity: Rarity,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
}

fn voucher_from_row(row: &SqliteRow) -> Result<Voucher> {
    let id_str: String = row.get("id");
    let rarity_str: String = row.get("rarity");
    let redeemed: i64 = row.get("redeemed");

    Ok(Voucher {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid voucher id {}: {}", id_str, e)))?,
        owner_uid: row.get("owner_uid"),
        brand: row.get("brand"),
        amount: row.get("amount"),
        rarity: Rarity::parse(&rarity_str)?,
        code: row.get("code"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        redeemed: redeemed != 0,
        redeemed_at: row.get("redeemed_at"),
    })
}

const VOUCHER_COLUMNS: &str =
    "id, owner_uid, brand, amount, rarity, code, created_at, expires_at, redeemed, redeemed_at";

/// Save a newly won voucher.
pub async fn create_voucher(pool: &SqlitePool, voucher: &Voucher) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vouchers (
            id, owner_uid, brand, amount, rarity, code,
            created_at, expires_at, redeemed, redeemed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(voucher.id.to_string())
    .bind(&voucher.owner_uid)
    .bind(&voucher.brand)
    .bind(voucher.amount)
    .bind(voucher.rarity.as_str())
    .bind(&voucher.code)
    .bind(voucher.created_at)
    .bind(voucher.expires_at)
    .bind(voucher.redeemed as i64)
    .bind(voucher.redeemed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a voucher by id.
pub async fn get_voucher(pool: &SqlitePool, id: Uuid) -> Result<Option<Voucher>> {
    let row = sqlx::query(&format!("SELECT {} FROM vouchers WHERE id = ?", VOUCHER_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(voucher_from_row(&row)?)),
        None => Ok(None),
    }
}

/// A user's vouchers, newest first.
pub async fn list_for_owner(pool: &SqlitePool, owner_uid: &str) -> Result<Vec<Voucher>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM vouchers WHERE owner_uid = ? ORDER BY created_at DESC",
        VOUCHER_COLUMNS
    ))
    .bind(owner_uid)
    .fetch_all(pool)
    .await?;

    rows.iter().map(voucher_from_row).collect()
}

/// Flip a voucher to redeemed, but only from the unredeemed state.
/// Returns true for the caller that actually consumed it.
pub async fn mark_redeemed(pool: &SqlitePool, id: Uuid, redeemed_at: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE vouchers SET redeemed = 1, redeemed_at = ? WHERE id = ? AND redeemed = 0",
    )
    .bind(redeemed_at)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete a user's vouchers that expired without being redeemed.
/// Redeemed vouchers are kept as history. Returns the number removed.
pub async fn delete_expired_unredeemed(
    pool: &SqlitePool,
    owner_uid: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM vouchers WHERE owner_uid = ? AND redeemed = 0 AND expires_at < ?")
            .bind(owner_uid)
            .bind(now)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

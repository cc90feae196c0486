//! Pack-opening ledger operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use tmk_common::{Error, Result};

use crate::gacha::Rarity;

/// One recorded pack open, feeding the recent-winners feed.
#[derive(Debug, Clone, Serialize)]
pub struct PackOpening {
    pub id: Uuid,
    pub user_id: String,
    pub brand: String,
    pub amount: i64,
    pub rarity: Rarity,
    pub is_free: bool,
    pub opened_at: DateTime<Utc>,
}

fn opening_from_row(row: &SqliteRow) -> Result<PackOpening> {
    let id_str: String = row.get("id");
    let rarity_str: String = row.get("rarity");
    let is_free: i64 = row.get("is_free");

    Ok(PackOpening {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid pack opening id {}: {}", id_str, e)))?,
        user_id: row.get("user_id"),
        brand: row.get("brand"),
        amount: row.get("amount"),
        rarity: Rarity::parse(&rarity_str)?,
        is_free: is_free != 0,
        opened_at: row.get("opened_at"),
    })
}

/// Record a pack open.
pub async fn record_opening(pool: &SqlitePool, opening: &PackOpening) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pack_openings (id, user_id, brand, amount, rarity, is_free, opened_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(opening.id.to_string())
    .bind(&opening.user_id)
    .bind(&opening.brand)
    .bind(opening.amount)
    .bind(opening.rarity.as_str())
    .bind(opening.is_free as i64)
    .bind(opening.opened_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent openings, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<PackOpening>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, brand, amount, rarity, is_free, opened_at
        FROM pack_openings
        ORDER BY opened_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(opening_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;
    use tmk_common::time;

    fn sample_opening(user_id: &str, opened_at: DateTime<Utc>) -> PackOpening {
        PackOpening {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            brand: "Shopee".to_string(),
            amount: 3,
            rarity: Rarity::Common,
            is_free: false,
            opened_at,
        }
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_limits() {
        let pool = test_pool().await;
        let now = time::now();

        for i in 0..5 {
            record_opening(&pool, &sample_opening("u1", now - Duration::minutes(i)))
                .await
                .unwrap();
        }

        let recent = list_recent(&pool, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].opened_at >= recent[1].opened_at);
        assert!(recent[1].opened_at >= recent[2].opened_at);
    }

    #[tokio::test]
    async fn test_round_trips_free_flag_and_rarity() {
        let pool = test_pool().await;
        let mut opening = sample_opening("u1", time::now());
        opening.is_free = true;
        opening.rarity = Rarity::Epic;

        record_opening(&pool, &opening).await.unwrap();

        let recent = list_recent(&pool, 10).await.unwrap();
        assert!(recent[0].is_free);
        assert_eq!(recent[0].rarity, Rarity::Epic);
    }
}

//! Account collection operations
//!
//! Balance and pity mutations are single conditional statements; the
//! database decides every race, and a balance can never go negative.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use tmk_common::Result;

/// A tester account: banana balance plus the gacha pity counter.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub uid: String,
    pub display_name: String,
    pub banana_balance: i64,
    pub pity_counter: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of a conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied,
    Insufficient,
}

fn account_from_row(row: &SqliteRow) -> Account {
    Account {
        uid: row.get("uid"),
        display_name: row.get("display_name"),
        banana_balance: row.get("banana_balance"),
        pity_counter: row.get("pity_counter"),
        created_at: row.get("created_at"),
    }
}

/// Create an account if the uid is unused. Returns true when a row was
/// inserted, false when the account already existed.
pub async fn create_account(
    pool: &SqlitePool,
    uid: &str,
    display_name: &str,
    starting_balance: i64,
    created_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO accounts (uid, display_name, banana_balance, pity_counter, created_at)
        VALUES (?, ?, ?, 0, ?)
        ON CONFLICT (uid) DO NOTHING
        "#,
    )
    .bind(uid)
    .bind(display_name)
    .bind(starting_balance)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load an account by uid.
pub async fn get_account(pool: &SqlitePool, uid: &str) -> Result<Option<Account>> {
    let row = sqlx::query(
        "SELECT uid, display_name, banana_balance, pity_counter, created_at FROM accounts WHERE uid = ?",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| account_from_row(&r)))
}

/// Debit `amount` only if the balance covers it. On a losing race or an
/// underfunded account the row is untouched and `Insufficient` comes
/// back; the balance never dips below zero.
pub async fn attempt_debit(pool: &SqlitePool, uid: &str, amount: i64) -> Result<DebitOutcome> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET banana_balance = banana_balance - ?
        WHERE uid = ? AND banana_balance >= ?
        "#,
    )
    .bind(amount)
    .bind(uid)
    .bind(amount)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        Ok(DebitOutcome::Applied)
    } else {
        Ok(DebitOutcome::Insufficient)
    }
}

/// Add `amount` bananas to an account. Returns true when the account
/// exists.
pub async fn credit(pool: &SqlitePool, uid: &str, amount: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE accounts SET banana_balance = banana_balance + ? WHERE uid = ?")
        .bind(amount)
        .bind(uid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Bump the pity counter after a draw that didn't reset it, returning
/// the new value.
pub async fn increment_pity(pool: &SqlitePool, uid: &str) -> Result<i64> {
    sqlx::query("UPDATE accounts SET pity_counter = pity_counter + 1 WHERE uid = ?")
        .bind(uid)
        .execute(pool)
        .await?;

    let row = sqlx::query("SELECT pity_counter FROM accounts WHERE uid = ?")
        .bind(uid)
        .fetch_one(pool)
        .await?;

    Ok(row.get("pity_counter"))
}

/// Zero the pity counter after an epic-or-better draw.
pub async fn reset_pity(pool: &SqlitePool, uid: &str) -> Result<()> {
    sqlx::query("UPDATE accounts SET pity_counter = 0 WHERE uid = ?")
        .bind(uid)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use tmk_common::time;

    pub(crate) async fn seed_account(pool: &SqlitePool, uid: &str, balance: i64) {
        create_account(pool, uid, "Tester", balance, time::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_account_is_idempotent() {
        let pool = test_pool().await;

        assert!(create_account(&pool, "u1", "First", 100, time::now()).await.unwrap());
        assert!(!create_account(&pool, "u1", "Second", 999, time::now()).await.unwrap());

        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.display_name, "First");
        assert_eq!(account.banana_balance, 100);
    }

    #[tokio::test]
    async fn test_debit_with_sufficient_balance() {
        let pool = test_pool().await;
        seed_account(&pool, "u1", 60).await;

        assert_eq!(attempt_debit(&pool, "u1", 50).await.unwrap(), DebitOutcome::Applied);

        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.banana_balance, 10);
    }

    #[tokio::test]
    async fn test_debit_insufficient_leaves_balance_unchanged() {
        let pool = test_pool().await;
        seed_account(&pool, "u1", 30).await;

        assert_eq!(
            attempt_debit(&pool, "u1", 50).await.unwrap(),
            DebitOutcome::Insufficient
        );

        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.banana_balance, 30);
    }

    #[tokio::test]
    async fn test_debit_missing_account_is_insufficient() {
        let pool = test_pool().await;
        assert_eq!(
            attempt_debit(&pool, "nobody", 50).await.unwrap(),
            DebitOutcome::Insufficient
        );
    }

    #[tokio::test]
    async fn test_debit_exact_balance_to_zero() {
        let pool = test_pool().await;
        seed_account(&pool, "u1", 50).await;

        assert_eq!(attempt_debit(&pool, "u1", 50).await.unwrap(), DebitOutcome::Applied);
        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.banana_balance, 0);
    }

    #[tokio::test]
    async fn test_credit() {
        let pool = test_pool().await;
        seed_account(&pool, "u1", 10).await;

        assert!(credit(&pool, "u1", 25).await.unwrap());
        assert!(!credit(&pool, "nobody", 25).await.unwrap());

        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.banana_balance, 35);
    }

    #[tokio::test]
    async fn test_pity_increment_and_reset() {
        let pool = test_pool().await;
        seed_account(&pool, "u1", 0).await;

        assert_eq!(increment_pity(&pool, "u1").await.unwrap(), 1);
        assert_eq!(increment_pity(&pool, "u1").await.unwrap(), 2);

        reset_pity(&pool, "u1").await.unwrap();
        let account = get_account(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(account.pity_counter, 0);
    }
}

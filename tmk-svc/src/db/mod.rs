//! Database access for tmk-svc
//!
//! Shared SQLite access, one module per collection. All mutations that
//! race across callers on the same key (balance debits, pity updates,
//! status transitions, daily claims) are single conditional statements
//! so the database is the arbiter, never in-process state.

pub mod accounts;
pub mod daily_claims;
pub mod missions;
pub mod pack_openings;
pub mod reports;
pub mod submissions;
pub mod vouchers;

use sqlx::SqlitePool;
use std::path::Path;
use tmk_common::Result;

/// Initialize the database connection pool, creating the file and
/// tables when missing.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the collection tables if they don't exist.
///
/// Public so tests can initialize an in-memory pool.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS missions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            questions TEXT NOT NULL DEFAULT '[]',
            num_testers INTEGER NOT NULL,
            submission_count INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Active',
            owner_uid TEXT NOT NULL,
            owner_email TEXT,
            payout INTEGER NOT NULL DEFAULT 0,
            feedback_summary TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            mission_id TEXT NOT NULL,
            tester_id TEXT NOT NULL,
            tester_name TEXT NOT NULL DEFAULT '',
            answers TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_mission ON submissions (mission_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            uid TEXT PRIMARY KEY,
            display_name TEXT NOT NULL DEFAULT '',
            banana_balance INTEGER NOT NULL DEFAULT 0 CHECK (banana_balance >= 0),
            pity_counter INTEGER NOT NULL DEFAULT 0 CHECK (pity_counter >= 0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vouchers (
            id TEXT PRIMARY KEY,
            owner_uid TEXT NOT NULL,
            brand TEXT NOT NULL,
            amount INTEGER NOT NULL,
            rarity TEXT NOT NULL,
            code TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            redeemed INTEGER NOT NULL DEFAULT 0,
            redeemed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vouchers_owner ON vouchers (owner_uid)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pack_openings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            brand TEXT NOT NULL,
            amount INTEGER NOT NULL,
            rarity TEXT NOT NULL,
            is_free INTEGER NOT NULL,
            opened_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_claims (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            claim_date TEXT NOT NULL,
            claimed_at TEXT NOT NULL,
            UNIQUE (user_id, claim_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mission_reports (
            id TEXT PRIMARY KEY,
            mission_id TEXT NOT NULL,
            ai_output TEXT NOT NULL,
            generated_at TEXT NOT NULL,
            source_submission_count INTEGER NOT NULL,
            questions_hash TEXT NOT NULL,
            model TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool).await.expect("Failed to initialize tables");
    pool
}

//! Integration tests for the pack-opening flow

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;

use tmk_common::{time, Error};
use tmk_svc::db::{self, accounts, pack_openings, vouchers};
use tmk_svc::gacha::{Rarity, PITY_THRESHOLD};
use tmk_svc::services::pack_service::{self, PACK_COST};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_tables(&pool).await.expect("Failed to initialize tables");
    pool
}

async fn seed_account(pool: &SqlitePool, uid: &str, balance: i64) {
    accounts::create_account(pool, uid, "Tester", balance, time::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_paid_open_with_insufficient_balance() {
    let pool = test_pool().await;
    seed_account(&pool, "u1", 30).await;
    let mut rng = StdRng::seed_from_u64(1);

    let result = pack_service::open_pack(&pool, "u1", false, &mut rng).await;
    assert!(matches!(result, Err(Error::StateConflict(_))));

    // Balance untouched, nothing won, nothing recorded.
    let account = accounts::get_account(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(account.banana_balance, 30);
    assert!(vouchers::list_for_owner(&pool, "u1").await.unwrap().is_empty());
    assert!(pack_openings::list_recent(&pool, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paid_open_debits_and_awards_voucher() {
    let pool = test_pool().await;
    seed_account(&pool, "u1", 60).await;
    let mut rng = StdRng::seed_from_u64(2);

    let opened = pack_service::open_pack(&pool, "u1", false, &mut rng).await.unwrap();

    let account = accounts::get_account(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(account.banana_balance, 60 - PACK_COST);

    // Pity moves according to the drawn tier.
    if opened.voucher.rarity.resets_pity() {
        assert_eq!(account.pity_counter, 0);
    } else {
        assert_eq!(account.pity_counter, 1);
    }
    assert_eq!(opened.pity_counter, account.pity_counter);

    let inventory = vouchers::list_for_owner(&pool, "u1").await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].id, opened.voucher.id);
    assert!(!inventory[0].redeemed);

    let recent = pack_openings::list_recent(&pool, 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].brand, opened.voucher.brand);
    assert!(!recent[0].is_free);
}

#[tokio::test]
async fn test_free_pack_claimable_once_per_day() {
    let pool = test_pool().await;
    seed_account(&pool, "u1", 0).await;
    let mut rng = StdRng::seed_from_u64(3);

    let opened = pack_service::open_pack(&pool, "u1", true, &mut rng).await.unwrap();
    assert!(opened.is_free);
    assert_ne!(opened.voucher.rarity, Rarity::Legendary);
    assert_eq!(opened.pity_counter, 0);

    let second = pack_service::open_pack(&pool, "u1", true, &mut rng).await;
    assert!(matches!(second, Err(Error::StateConflict(_))));

    // Free packs never touch the balance or pity.
    let account = accounts::get_account(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(account.banana_balance, 0);
    assert_eq!(account.pity_counter, 0);
    assert_eq!(vouchers::list_for_owner(&pool, "u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pity_threshold_forces_epic_and_resets() {
    let pool = test_pool().await;
    seed_account(&pool, "u1", PACK_COST).await;
    for _ in 0..PITY_THRESHOLD {
        accounts::increment_pity(&pool, "u1").await.unwrap();
    }
    let mut rng = StdRng::seed_from_u64(4);

    let opened = pack_service::open_pack(&pool, "u1", false, &mut rng).await.unwrap();

    assert_eq!(opened.voucher.rarity, Rarity::Epic);
    assert_eq!(opened.pity_counter, 0);
    let account = accounts::get_account(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(account.pity_counter, 0);
}

#[tokio::test]
async fn test_open_for_missing_account() {
    let pool = test_pool().await;
    let mut rng = StdRng::seed_from_u64(5);

    let result = pack_service::open_pack(&pool, "nobody", false, &mut rng).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

//! Voucher pack opening
//!
//! Ties the draw engine to accounts, daily claims, vouchers, and the
//! pack-opening ledger. Paid packs debit bananas and advance the pity
//! counter; free packs consume the daily claim and leave pity alone.

use chrono::Duration;
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use tmk_common::{time, Error, Result};

use crate::db::accounts::{self, DebitOutcome};
use crate::db::pack_openings::{self, PackOpening};
use crate::db::vouchers::{self, Voucher};
use crate::db::daily_claims;
use crate::gacha::{
    determine_rarity, generate_voucher_code, select_prize, FREE_PACK_ODDS, PAID_PACK_ODDS,
};

/// Bananas debited per paid pack.
pub const PACK_COST: i64 = 50;

/// Days until a freshly won voucher expires.
pub const VOUCHER_VALIDITY_DAYS: i64 = 30;

/// Result of a pack open.
#[derive(Debug, Clone, Serialize)]
pub struct OpenedPack {
    pub voucher: Voucher,
    /// Pity counter after this open (always 0 for free packs).
    pub pity_counter: i64,
    pub is_free: bool,
}

/// Open a voucher pack for a user.
///
/// Free packs: the daily claim is consumed first, so a duplicate claim
/// fails before any draw happens, and the pity counter is untouched.
/// Paid packs: the balance debit is the commit point. Failures after
/// the debit surface to the caller without reversing it; a
/// compensating credit is the extension point if that ever needs to
/// change.
pub async fn open_pack(
    pool: &SqlitePool,
    uid: &str,
    is_free: bool,
    rng: &mut (impl Rng + Send),
) -> Result<OpenedPack> {
    let account = accounts::get_account(pool, uid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Account {} not found", uid)))?;

    let pity_counter = if is_free {
        let claim_date = time::today().to_string();
        let claimed = daily_claims::try_claim(pool, uid, &claim_date, time::now()).await?;
        if !claimed {
            return Err(Error::StateConflict(
                "You have already claimed your free pack today".to_string(),
            ));
        }
        0
    } else {
        match accounts::attempt_debit(pool, uid, PACK_COST).await? {
            DebitOutcome::Applied => {}
            DebitOutcome::Insufficient => {
                return Err(Error::StateConflict(format!(
                    "Insufficient bananas. You need {} bananas.",
                    PACK_COST
                )));
            }
        }
        account.pity_counter
    };

    let odds = if is_free { &FREE_PACK_ODDS } else { &PAID_PACK_ODDS };
    let rarity = determine_rarity(odds, pity_counter.max(0) as u32, rng);

    let new_pity = if is_free {
        0
    } else if rarity.resets_pity() {
        accounts::reset_pity(pool, uid).await?;
        0
    } else {
        accounts::increment_pity(pool, uid).await?
    };

    let prize = select_prize(rarity, rng);
    let code = generate_voucher_code(prize.brand, rng);
    let now = time::now();

    let voucher = Voucher {
        id: Uuid::new_v4(),
        owner_uid: uid.to_string(),
        brand: prize.brand.to_string(),
        amount: prize.amount,
        rarity,
        code,
        created_at: now,
        expires_at: now + Duration::days(VOUCHER_VALIDITY_DAYS),
        redeemed: false,
        redeemed_at: None,
    };
    vouchers::create_voucher(pool, &voucher).await?;

    pack_openings::record_opening(
        pool,
        &PackOpening {
            id: Uuid::new_v4(),
            user_id: uid.to_string(),
            brand: voucher.brand.clone(),
            amount: voucher.amount,
            rarity,
            is_free,
            opened_at: now,
        },
    )
    .await?;

    tracing::info!(
        uid = %uid,
        brand = %voucher.brand,
        rarity = %rarity,
        is_free,
        pity = new_pity,
        "Pack opened"
    );

    Ok(OpenedPack {
        voucher,
        pity_counter: new_pity,
        is_free,
    })
}

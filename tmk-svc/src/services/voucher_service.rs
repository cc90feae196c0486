//! Voucher redemption and expiry sweeping

use sqlx::SqlitePool;
use uuid::Uuid;

use tmk_common::{time, Error, Result};

use crate::db::vouchers::{self, Voucher};

/// Redeem a voucher on behalf of its owner.
///
/// Guard order: existence, ownership, prior redemption, expiry. The
/// final flip is conditional on the unredeemed state, so two racing
/// redeemers see one success and one already-redeemed conflict.
pub async fn redeem_voucher(pool: &SqlitePool, voucher_id: Uuid, uid: &str) -> Result<Voucher> {
    let voucher = vouchers::get_voucher(pool, voucher_id)
        .await?
        .ok_or_else(|| Error::NotFound("Voucher not found".to_string()))?;

    if voucher.owner_uid != uid {
        return Err(Error::Authorization(
            "You do not own this voucher".to_string(),
        ));
    }
    if voucher.redeemed {
        return Err(Error::StateConflict(
            "This voucher has already been redeemed".to_string(),
        ));
    }

    let now = time::now();
    if now > voucher.expires_at {
        return Err(Error::StateConflict(
            "This voucher has expired".to_string(),
        ));
    }

    if !vouchers::mark_redeemed(pool, voucher_id, now).await? {
        // Lost the race after the read above.
        return Err(Error::StateConflict(
            "This voucher has already been redeemed".to_string(),
        ));
    }

    tracing::info!(voucher_id = %voucher_id, uid = %uid, "Voucher redeemed");

    Ok(Voucher {
        redeemed: true,
        redeemed_at: Some(now),
        ..voucher
    })
}

/// Remove a user's expired, unredeemed vouchers. Idempotent: a second
/// run finds nothing left to remove.
pub async fn sweep_expired(pool: &SqlitePool, uid: &str) -> Result<u64> {
    let removed = vouchers::delete_expired_unredeemed(pool, uid, time::now()).await?;
    if removed > 0 {
        tracing::info!(uid = %uid, removed, "Expired vouchers swept");
    }
    Ok(removed)
}

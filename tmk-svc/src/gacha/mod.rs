//! Gacha-style reward draw engine
//!
//! Pure weighted-random selection: rarity odds tables, the pity
//! mechanism, prize pools, and voucher code generation. Persistence and
//! balance accounting live in `services::pack_service`.

pub mod odds;
pub mod selector;

pub use odds::{OddsTable, Rarity, FREE_PACK_ODDS, PAID_PACK_ODDS};
pub use selector::{
    determine_rarity, generate_voucher_code, rarity_for_roll, select_prize, Prize, PITY_THRESHOLD,
};

//! Weighted rarity selection with pity forcing, prize pool draws, and
//! voucher code generation

use rand::Rng;

use super::odds::{OddsTable, Rarity};

/// Pack opens before a guaranteed epic-or-better outcome.
pub const PITY_THRESHOLD: u32 = 10;

/// One prize candidate within a rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prize {
    pub brand: &'static str,
    pub amount: i64,
}

const COMMON_PRIZES: &[Prize] = &[
    Prize { brand: "Shopee", amount: 3 },
    Prize { brand: "GrabFood", amount: 5 },
    Prize { brand: "FairPrice", amount: 5 },
    Prize { brand: "Starbucks", amount: 5 },
    Prize { brand: "Popular", amount: 5 },
];

const RARE_PRIZES: &[Prize] = &[
    Prize { brand: "Shopee", amount: 10 },
    Prize { brand: "Grab", amount: 10 },
    Prize { brand: "Netflix", amount: 10 },
    Prize { brand: "GymBoxx", amount: 15 },
    Prize { brand: "Golden Village", amount: 12 },
];

const EPIC_PRIZES: &[Prize] = &[
    Prize { brand: "Shopee", amount: 25 },
    Prize { brand: "Grab", amount: 25 },
    Prize { brand: "Netflix", amount: 30 },
    Prize { brand: "Courts", amount: 30 },
    Prize { brand: "Sephora", amount: 30 },
];

const LEGENDARY_PRIZES: &[Prize] = &[
    Prize { brand: "Shopee", amount: 100 },
    Prize { brand: "Grab", amount: 100 },
    Prize { brand: "Netflix", amount: 100 },
    Prize { brand: "Takashimaya", amount: 100 },
    Prize { brand: "Apple", amount: 100 },
];

/// Fixed candidate pool for a rarity tier.
pub fn prize_pool(rarity: Rarity) -> &'static [Prize] {
    match rarity {
        Rarity::Common => COMMON_PRIZES,
        Rarity::Rare => RARE_PRIZES,
        Rarity::Epic => EPIC_PRIZES,
        Rarity::Legendary => LEGENDARY_PRIZES,
    }
}

/// Map a uniform roll in [0,1) onto the cumulative rarity bands.
///
/// Bands are walked legendary -> epic -> rare; a roll past the summed
/// mass (floating point undershoot) lands on common.
pub fn rarity_for_roll(odds: &OddsTable, roll: f64) -> Rarity {
    let mut cumulative = odds.legendary;
    if roll < cumulative {
        return Rarity::Legendary;
    }

    cumulative += odds.epic;
    if roll < cumulative {
        return Rarity::Epic;
    }

    cumulative += odds.rare;
    if roll < cumulative {
        return Rarity::Rare;
    }

    Rarity::Common
}

/// Draw a rarity from the odds table.
///
/// A pity counter at or past `PITY_THRESHOLD` force-returns epic
/// without consuming a roll.
pub fn determine_rarity<R: Rng>(odds: &OddsTable, pity_counter: u32, rng: &mut R) -> Rarity {
    if pity_counter >= PITY_THRESHOLD {
        return Rarity::Epic;
    }
    rarity_for_roll(odds, rng.gen::<f64>())
}

/// Pick uniformly from the prize pool of the given tier.
pub fn select_prize<R: Rng>(rarity: Rarity, rng: &mut R) -> Prize {
    let pool = prize_pool(rarity);
    pool[rng.gen_range(0..pool.len())]
}

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_SUFFIX_LEN: usize = 8;

/// Voucher code: first three letters of the brand uppercased, a dash,
/// then eight random base36 characters.
///
/// Uniqueness is best-effort only; collisions are possible and
/// tolerated because the voucher id, not the code, is the record key.
pub fn generate_voucher_code<R: Rng>(brand: &str, rng: &mut R) -> String {
    let prefix: String = brand.chars().take(3).collect::<String>().to_uppercase();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", prefix, suffix)
}

//! Rarity tiers and pack odds tables

use serde::{Deserialize, Serialize};
use std::fmt;
use tmk_common::{Error, Result};

/// Voucher rarity tier, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Parse the lowercase form stored in the database.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            other => Err(Error::Internal(format!("Unknown rarity: {}", other))),
        }
    }

    /// Epic and above resets the pity counter.
    pub fn resets_pity(&self) -> bool {
        matches!(self, Rarity::Epic | Rarity::Legendary)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability mass per rarity tier. Tiers are expected to sum to 1.0;
/// any rounding undershoot falls back to common during the band walk.
#[derive(Debug, Clone, Copy)]
pub struct OddsTable {
    pub common: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
}

/// Paid pack distribution: 70% / 20% / 8% / 2%.
pub const PAID_PACK_ODDS: OddsTable = OddsTable {
    common: 0.70,
    rare: 0.20,
    epic: 0.08,
    legendary: 0.02,
};

/// Free daily pack distribution: 85% / 12% / 3%, no legendary mass.
pub const FREE_PACK_ODDS: OddsTable = OddsTable {
    common: 0.85,
    rare: 0.12,
    epic: 0.03,
    legendary: 0.00,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_round_trip() {
        for rarity in [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary] {
            assert_eq!(Rarity::parse(rarity.as_str()).unwrap(), rarity);
        }
    }

    #[test]
    fn test_unknown_rarity_rejected() {
        assert!(Rarity::parse("mythic").is_err());
    }

    #[test]
    fn test_resets_pity_only_for_epic_and_above() {
        assert!(!Rarity::Common.resets_pity());
        assert!(!Rarity::Rare.resets_pity());
        assert!(Rarity::Epic.resets_pity());
        assert!(Rarity::Legendary.resets_pity());
    }

    #[test]
    fn test_odds_tables_sum_to_one() {
        for odds in [PAID_PACK_ODDS, FREE_PACK_ODDS] {
            let total = odds.common + odds.rare + odds.epic + odds.legendary;
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_free_table_has_no_legendary_mass() {
        assert_eq!(FREE_PACK_ODDS.legendary, 0.0);
    }

    #[test]
    fn test_rarity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Rarity::Epic).unwrap(), "\"epic\"");
        let parsed: Rarity = serde_json::from_str("\"legendary\"").unwrap();
        assert_eq!(parsed, Rarity::Legendary);
    }
}

//! Fee tiers and their tick spacings

use crate::error::{AmmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap-fee bucket of a pool. The fee is in hundredths of a basis point
/// (3000 = 0.3%) and fixes the pool's tick spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FeeTier {
    /// 0.01%, spacing 1
    Lowest,
    /// 0.05%, spacing 10
    Low,
    /// 0.3%, spacing 60
    Medium,
    /// 1%, spacing 200
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [Self::Lowest, Self::Low, Self::Medium, Self::High];

    /// Fee in hundredths of a basis point, as passed to the contracts
    pub fn fee(self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::Medium => 3000,
            Self::High => 10_000,
        }
    }

    pub fn tick_spacing(self) -> i32 {
        match self {
            Self::Lowest => 1,
            Self::Low => 10,
            Self::Medium => 60,
            Self::High => 200,
        }
    }

    pub fn from_fee(fee: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.fee() == fee)
            .ok_or(AmmError::UnsupportedFeeTier { fee })
    }

    /// Fee as a fraction of the input amount (3000 -> 0.003)
    pub fn as_fraction(self) -> f64 {
        self.fee() as f64 / 1_000_000.0
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = AmmError;

    fn try_from(fee: u32) -> Result<Self> {
        Self::from_fee(fee)
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> u32 {
        tier.fee()
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.fee() as f64 / 10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_tier_spacings() {
        assert_eq!(FeeTier::Low.tick_spacing(), 10);
        assert_eq!(FeeTier::Medium.tick_spacing(), 60);
        assert_eq!(FeeTier::High.tick_spacing(), 200);
        assert_eq!(FeeTier::from_fee(3000).unwrap(), FeeTier::Medium);
    }

    #[test]
    fn test_unknown_fee_rejected() {
        assert_eq!(
            FeeTier::from_fee(2500),
            Err(AmmError::UnsupportedFeeTier { fee: 2500 })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FeeTier::Medium.to_string(), "0.3%");
        assert_eq!(FeeTier::Low.to_string(), "0.05%");
    }
}

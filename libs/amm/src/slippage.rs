//! Slippage tolerance and minimum-amount derivation

use crate::error::{AmmError, Result};
use crate::liquidity_math::mul_div;
use ethereum_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum acceptable fractional deviation between a quoted or planned
/// amount and the executed one, as `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageTolerance {
    numerator: u64,
    denominator: u64,
}

impl SlippageTolerance {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 || numerator >= denominator {
            return Err(AmmError::InvalidSlippage {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Tolerance in basis points (50 = 0.5%)
    pub fn from_bps(bps: u32) -> Result<Self> {
        Self::new(bps as u64, 10_000)
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// `amount - floor(amount * numerator / denominator)`
    pub fn minimum_amount(&self, amount: U256) -> Result<U256> {
        let allowance = mul_div(
            amount,
            U256::from(self.numerator),
            U256::from(self.denominator),
        )?;
        Ok(amount - allowance)
    }

    /// Tolerance as a percentage (0.5 for 50 bps)
    pub fn as_percent(&self) -> Decimal {
        Decimal::from(self.numerator) * Decimal::ONE_HUNDRED / Decimal::from(self.denominator)
    }
}

impl Default for SlippageTolerance {
    fn default() -> Self {
        Self {
            numerator: 50,
            denominator: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_half_percent_of_one_million() {
        let slippage = SlippageTolerance::from_bps(50).unwrap();
        assert_eq!(
            slippage.minimum_amount(U256::from(1_000_000u64)).unwrap(),
            U256::from(995_000u64)
        );
    }

    #[test]
    fn test_floor_division_keeps_minimum_high() {
        // floor(999 * 5 / 1000) = 4, so the minimum is 995 rather than 994
        let slippage = SlippageTolerance::new(5, 1000).unwrap();
        assert_eq!(
            slippage.minimum_amount(U256::from(999u64)).unwrap(),
            U256::from(995u64)
        );
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        let slippage = SlippageTolerance::new(0, 1).unwrap();
        assert_eq!(
            slippage.minimum_amount(U256::from(42u64)).unwrap(),
            U256::from(42u64)
        );
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        assert!(SlippageTolerance::new(1, 0).is_err());
        assert!(SlippageTolerance::new(10, 10).is_err());
        assert!(SlippageTolerance::from_bps(10_000).is_err());
    }

    #[test]
    fn test_as_percent() {
        assert_eq!(SlippageTolerance::from_bps(50).unwrap().as_percent(), dec!(0.5));
    }
}

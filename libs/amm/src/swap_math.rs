//! Quote-side estimates: fee paid and price impact
//!
//! The quoter contract is the source of truth for output amounts; these
//! helpers only describe a quote relative to the pool's spot price.

use crate::fee_tier::FeeTier;
use crate::tick_math::{sqrt_price_x96_to_price, u256_to_f64};
use ethereum_types::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Fee charged on `amount_in` by the pool's fee tier (rounded down)
pub fn estimate_fee(amount_in: U256, fee_tier: FeeTier) -> U256 {
    amount_in * U256::from(fee_tier.fee()) / U256::from(1_000_000u64)
}

/// Spot price of the input token in output-token raw units
pub fn spot_price(sqrt_price_x96: U256, zero_for_one: bool) -> f64 {
    let price = sqrt_price_x96_to_price(sqrt_price_x96);
    if zero_for_one {
        price
    } else if price > 0.0 {
        1.0 / price
    } else {
        0.0
    }
}

/// Percentage shortfall of `amount_out` against a fee-adjusted fill at the
/// spot price. Never negative; zero when the spot price is unusable.
pub fn estimate_price_impact(
    sqrt_price_x96: U256,
    fee_tier: FeeTier,
    zero_for_one: bool,
    amount_in: U256,
    amount_out: U256,
) -> Decimal {
    let ideal_out =
        u256_to_f64(amount_in) * (1.0 - fee_tier.as_fraction()) * spot_price(sqrt_price_x96, zero_for_one);
    if !ideal_out.is_finite() || ideal_out <= 0.0 {
        return Decimal::ZERO;
    }

    let impact = (1.0 - u256_to_f64(amount_out) / ideal_out) * 100.0;
    Decimal::from_f64(impact.max(0.0))
        .map(|d| d.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::Q96;

    #[test]
    fn test_fee_estimate() {
        assert_eq!(
            estimate_fee(U256::from(1_000_000u64), FeeTier::Medium),
            U256::from(3_000u64)
        );
        assert_eq!(estimate_fee(U256::from(999u64), FeeTier::Low), U256::zero());
    }

    #[test]
    fn test_price_impact_at_parity() {
        // Price 1, 0.3% fee: a fill of 997 for 1000 has no impact
        let impact = estimate_price_impact(
            Q96,
            FeeTier::Medium,
            true,
            U256::from(1_000u64),
            U256::from(997u64),
        );
        assert_eq!(impact, Decimal::ZERO);

        let impact = estimate_price_impact(
            Q96,
            FeeTier::Medium,
            false,
            U256::from(1_000u64),
            U256::from(897u64),
        );
        assert!(impact > Decimal::from(10) && impact < Decimal::from(11));
    }

    #[test]
    fn test_price_impact_without_spot_price() {
        let impact = estimate_price_impact(
            U256::zero(),
            FeeTier::Medium,
            true,
            U256::from(1_000u64),
            U256::from(1u64),
        );
        assert_eq!(impact, Decimal::ZERO);
    }
}

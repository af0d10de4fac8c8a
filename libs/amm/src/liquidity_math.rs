//! Concentrated-liquidity amount formulas
//!
//! Mirrors the periphery `LiquidityAmounts` library and the core
//! `SqrtPriceMath` amount deltas. All intermediates are carried in 512 bits
//! so `sqrtPrice * sqrtPrice` and `liquidity << 96` never overflow.

use crate::error::{AmmError, Result};
use crate::tick_math::Q96;
use ethereum_types::{U256, U512};

/// `floor(a * b / denominator)` with a 512-bit intermediate
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AmmError::DivisionByZero { operation: "mul_div" });
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| AmmError::Overflow { operation: "mul_div" })
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AmmError::DivisionByZero {
            operation: "mul_div_rounding_up",
        });
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient += U512::one();
    }
    U256::try_from(quotient).map_err(|_| AmmError::Overflow {
        operation: "mul_div_rounding_up",
    })
}

fn div_rounding_up(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(AmmError::DivisionByZero {
            operation: "div_rounding_up",
        });
    }
    let quotient = a / b;
    Ok(if (a % b).is_zero() { quotient } else { quotient + U256::one() })
}

fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

fn to_liquidity(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(AmmError::Overflow {
            operation: "liquidity exceeds uint128",
        });
    }
    Ok(value.as_u128())
}

/// Where the pool price sits relative to a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    /// Price at or below the lower bound: the range holds only token0
    Below,
    /// Price inside the range: both tokens
    Within,
    /// Price at or above the upper bound: the range holds only token1
    Above,
}

pub fn range_position(sqrt_price_x96: U256, sqrt_ratio_a: U256, sqrt_ratio_b: U256) -> RangePosition {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if sqrt_price_x96 <= lower {
        RangePosition::Below
    } else if sqrt_price_x96 < upper {
        RangePosition::Within
    } else {
        RangePosition::Above
    }
}

/// `L = amount0 * sqrtA * sqrtB / (sqrtB - sqrtA)`
pub fn get_liquidity_for_amount0(sqrt_ratio_a: U256, sqrt_ratio_b: U256, amount0: U256) -> Result<u128> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    let intermediate = mul_div(lower, upper, Q96)?;
    to_liquidity(mul_div(amount0, intermediate, upper - lower)?)
}

/// `L = amount1 / (sqrtB - sqrtA)`
pub fn get_liquidity_for_amount1(sqrt_ratio_a: U256, sqrt_ratio_b: U256, amount1: U256) -> Result<u128> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    to_liquidity(mul_div(amount1, Q96, upper - lower)?)
}

/// Maximum liquidity the desired amounts can mint for the range at the
/// current price
pub fn get_liquidity_for_amounts(
    sqrt_price_x96: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if lower == upper {
        return Err(AmmError::DivisionByZero {
            operation: "empty price range",
        });
    }

    match range_position(sqrt_price_x96, lower, upper) {
        RangePosition::Below => get_liquidity_for_amount0(lower, upper, amount0),
        RangePosition::Within => {
            let liquidity0 = get_liquidity_for_amount0(sqrt_price_x96, upper, amount0)?;
            let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price_x96, amount1)?;
            Ok(liquidity0.min(liquidity1))
        }
        RangePosition::Above => get_liquidity_for_amount1(lower, upper, amount1),
    }
}

/// `amount0 = L * 2^96 * (sqrtB - sqrtA) / sqrtB / sqrtA`
pub fn get_amount0_for_liquidity(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if lower.is_zero() {
        return Err(AmmError::DivisionByZero {
            operation: "get_amount0_for_liquidity",
        });
    }
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// `amount1 = L * (sqrtB - sqrtA) / 2^96`
pub fn get_amount1_for_liquidity(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// Token amounts represented by `liquidity` over the range at the current
/// price. `round_up` matches what the pool charges on mint; rounding down
/// matches what it pays out on burn.
pub fn get_amounts_for_liquidity(
    sqrt_price_x96: U256,
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<(U256, U256)> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);

    match range_position(sqrt_price_x96, lower, upper) {
        RangePosition::Below => Ok((
            get_amount0_for_liquidity(lower, upper, liquidity, round_up)?,
            U256::zero(),
        )),
        RangePosition::Within => Ok((
            get_amount0_for_liquidity(sqrt_price_x96, upper, liquidity, round_up)?,
            get_amount1_for_liquidity(lower, sqrt_price_x96, liquidity, round_up)?,
        )),
        RangePosition::Above => Ok((
            U256::zero(),
            get_amount1_for_liquidity(lower, upper, liquidity, round_up)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::get_sqrt_ratio_at_tick;

    fn e18(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // (2^200 * 2^100) / 2^150 overflows 256 bits only in the intermediate
        let a = U256::one() << 200;
        let b = U256::one() << 100;
        let d = U256::one() << 150;
        assert_eq!(mul_div(a, b, d).unwrap(), U256::one() << 150);
        assert!(mul_div(a, b, U256::one()).is_err());
        assert!(mul_div(a, b, U256::zero()).is_err());
    }

    #[test]
    fn test_mul_div_rounding_up() {
        assert_eq!(
            mul_div_rounding_up(U256::from(10u64), U256::from(10u64), U256::from(3u64)).unwrap(),
            U256::from(34u64)
        );
        assert_eq!(
            mul_div(U256::from(10u64), U256::from(10u64), U256::from(3u64)).unwrap(),
            U256::from(33u64)
        );
    }

    #[test]
    fn test_liquidity_in_range_uses_both_tokens() {
        let sqrt_p = get_sqrt_ratio_at_tick(0).unwrap();
        let sqrt_a = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_b = get_sqrt_ratio_at_tick(600).unwrap();

        let liquidity = get_liquidity_for_amounts(sqrt_p, sqrt_a, sqrt_b, e18(1), e18(1)).unwrap();
        assert!(liquidity > 0);

        let (amount0, amount1) = get_amounts_for_liquidity(sqrt_p, sqrt_a, sqrt_b, liquidity, true).unwrap();
        // Symmetric range around price 1: both sides used, neither exceeds desired by more than rounding
        assert!(amount0 > U256::zero() && amount1 > U256::zero());
        assert!(amount0 <= e18(1) + U256::one());
        assert!(amount1 <= e18(1) + U256::one());
    }

    #[test]
    fn test_liquidity_below_range_is_token0_only() {
        let sqrt_p = get_sqrt_ratio_at_tick(-1200).unwrap();
        let sqrt_a = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_b = get_sqrt_ratio_at_tick(600).unwrap();

        let liquidity = get_liquidity_for_amounts(sqrt_p, sqrt_a, sqrt_b, e18(1), U256::zero()).unwrap();
        assert!(liquidity > 0);
        assert_eq!(
            range_position(sqrt_p, sqrt_a, sqrt_b),
            RangePosition::Below
        );

        let (amount0, amount1) = get_amounts_for_liquidity(sqrt_p, sqrt_a, sqrt_b, liquidity, false).unwrap();
        assert!(amount0 > U256::zero());
        assert_eq!(amount1, U256::zero());
    }

    #[test]
    fn test_liquidity_above_range_is_token1_only() {
        let sqrt_p = get_sqrt_ratio_at_tick(1200).unwrap();
        let sqrt_a = get_sqrt_ratio_at_tick(-600).unwrap();
        let sqrt_b = get_sqrt_ratio_at_tick(600).unwrap();

        // token0 is ignored above the range
        let liquidity = get_liquidity_for_amounts(sqrt_p, sqrt_a, sqrt_b, e18(5), e18(1)).unwrap();
        let (amount0, amount1) = get_amounts_for_liquidity(sqrt_p, sqrt_a, sqrt_b, liquidity, false).unwrap();
        assert_eq!(amount0, U256::zero());
        assert!(amount1 > U256::zero() && amount1 <= e18(1));
    }

    #[test]
    fn test_round_trip_never_exceeds_desired() {
        let sqrt_p = get_sqrt_ratio_at_tick(76012).unwrap();
        let sqrt_a = get_sqrt_ratio_at_tick(75000).unwrap();
        let sqrt_b = get_sqrt_ratio_at_tick(77000).unwrap();
        let amount0 = e18(3);
        let amount1 = e18(6000);

        let liquidity = get_liquidity_for_amounts(sqrt_p, sqrt_a, sqrt_b, amount0, amount1).unwrap();
        let (out0, out1) = get_amounts_for_liquidity(sqrt_p, sqrt_a, sqrt_b, liquidity, false).unwrap();
        assert!(out0 <= amount0);
        assert!(out1 <= amount1);
    }

    #[test]
    fn test_empty_range_rejected() {
        let sqrt = get_sqrt_ratio_at_tick(0).unwrap();
        assert!(get_liquidity_for_amounts(sqrt, sqrt, sqrt, e18(1), e18(1)).is_err());
    }
}

//! Tick, price and sqrtPriceX96 conversions
//!
//! Two families of functions live here:
//!
//! - **Float conversions** (`price_to_tick`, `price_to_sqrt_price_x96`, ...)
//!   used when a human-facing price has to be turned into something the
//!   contracts accept, e.g. the starting price of a new pool or the bounds of
//!   a target-price band.
//! - **Exact conversions** (`get_sqrt_ratio_at_tick`, `get_tick_at_sqrt_ratio`)
//!   that reproduce the on-chain `TickMath` library bit for bit. Liquidity and
//!   amount formulas always go through these so the client computes exactly
//!   what the pool will charge.

use crate::error::{AmmError, Result};
use ethereum_types::U256;
use tracing::warn;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// sqrt ratio at MIN_TICK (4295128739)
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);

/// sqrt ratio at MAX_TICK (1461446703485210103287273052203988822378723970342)
pub const MAX_SQRT_RATIO: U256 = U256([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

/// 2^96, the fixed-point scale of sqrtPriceX96
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// 2^96 as a float
const Q96_F64: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// sqrt(1.0001^-(2^i)) in Q128, i = 0..19
const SQRT_RATIO_FACTORS: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// Fallback used when a computed starting price is unusable on-chain
pub const DEFAULT_TICK: i32 = 0;

/// sqrtPriceX96 of price 1
pub fn default_sqrt_price_x96() -> U256 {
    Q96
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AmmError::InvalidPrice { price });
    }
    Ok(())
}

fn check_tick(tick: i64) -> Result<i32> {
    if tick < MIN_TICK as i64 || tick > MAX_TICK as i64 {
        return Err(AmmError::TickOutOfBounds {
            tick,
            min: MIN_TICK,
            max: MAX_TICK,
        });
    }
    Ok(tick as i32)
}

/// `floor(ln(price) / ln(1.0001))`, rejected when outside the tick bounds
pub fn price_to_tick(price: f64) -> Result<i32> {
    validate_price(price)?;
    let raw = (price.ln() / 1.0001f64.ln()).floor();
    check_tick(raw as i64)
}

/// `1.0001^tick`
pub fn tick_to_price(tick: i32) -> f64 {
    1.0001f64.powi(tick)
}

/// `floor(sqrt(price) * 2^96)`, rejected when outside the sqrt ratio bounds
pub fn price_to_sqrt_price_x96(price: f64) -> Result<U256> {
    validate_price(price)?;
    let scaled = price.sqrt() * Q96_F64;
    let value = f64_to_u256_floor(scaled).ok_or(AmmError::Overflow {
        operation: "price_to_sqrt_price_x96",
    })?;
    if value < MIN_SQRT_RATIO || value >= MAX_SQRT_RATIO {
        return Err(AmmError::SqrtPriceOutOfBounds {
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// `(sqrtPriceX96 / 2^96)^2`
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256) -> f64 {
    let sqrt = u256_to_f64(sqrt_price_x96) / Q96_F64;
    sqrt * sqrt
}

/// Tick for an on-chain call. Out-of-range prices fall back to tick 0;
/// invalid prices are still an error.
pub fn safe_tick(price: f64) -> Result<i32> {
    match price_to_tick(price) {
        Ok(tick) => Ok(tick),
        Err(AmmError::TickOutOfBounds { tick, .. }) => {
            warn!(price, tick, "Price maps outside tick bounds, using tick 0");
            Ok(DEFAULT_TICK)
        }
        Err(e) => Err(e),
    }
}

/// sqrtPriceX96 for an on-chain call. Out-of-range prices fall back to 2^96.
pub fn safe_sqrt_price_x96(price: f64) -> Result<U256> {
    match price_to_sqrt_price_x96(price) {
        Ok(value) => Ok(value),
        Err(AmmError::SqrtPriceOutOfBounds { value }) => {
            warn!(price, %value, "sqrtPriceX96 outside protocol bounds, using price 1");
            Ok(default_sqrt_price_x96())
        }
        Err(AmmError::Overflow { .. }) => {
            warn!(price, "sqrtPriceX96 overflows 256 bits, using price 1");
            Ok(default_sqrt_price_x96())
        }
        Err(e) => Err(e),
    }
}

/// Convert a human price (whole token1 per whole token0) to the raw ratio the
/// pool stores (smallest units of token1 per smallest unit of token0).
pub fn adjust_price_for_decimals(human_price: f64, decimals0: u8, decimals1: u8) -> f64 {
    human_price * 10f64.powi(decimals1 as i32 - decimals0 as i32)
}

/// Exact `TickMath.getSqrtRatioAtTick`
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    check_tick(tick as i64)?;
    let abs_tick = tick.unsigned_abs();

    let mut ratio = U256([0, 0, 1, 0]); // 2^128
    for (bit, factor) in SQRT_RATIO_FACTORS.iter().enumerate() {
        if abs_tick & (1 << bit) != 0 {
            ratio = (ratio * U256::from(*factor)) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up so the result is never below the true value
    let round_up = if (ratio & U256::from(u32::MAX)).is_zero() {
        U256::zero()
    } else {
        U256::one()
    };
    Ok((ratio >> 32) + round_up)
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(AmmError::SqrtPriceOutOfBounds {
            value: sqrt_price_x96.to_string(),
        });
    }

    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

/// Round `tick` down to a multiple of `spacing` (toward negative infinity)
pub fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

/// Nearest multiple of `spacing` to `tick` that is still within the bounds
pub fn nearest_usable_tick(tick: i32, spacing: i32) -> i32 {
    let rounded = ((tick as f64 / spacing as f64).round() as i32) * spacing;
    if rounded < MIN_TICK {
        rounded + spacing
    } else if rounded > MAX_TICK {
        rounded - spacing
    } else {
        rounded
    }
}

pub fn min_usable_tick(spacing: i32) -> i32 {
    nearest_usable_tick(MIN_TICK, spacing)
}

pub fn max_usable_tick(spacing: i32) -> i32 {
    nearest_usable_tick(MAX_TICK, spacing)
}

/// Floor conversion of a non-negative float into a U256; `None` when it
/// does not fit or is not finite.
pub fn f64_to_u256_floor(value: f64) -> Option<U256> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value < 1.0 {
        return Some(U256::zero());
    }

    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);

    if exponent >= 0 {
        if exponent > 256 - 53 {
            return None;
        }
        Some(U256::from(mantissa) << exponent as usize)
    } else {
        Some(U256::from(mantissa >> (-exponent) as u32))
    }
}

pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

//! Position builder: turns a placement strategy and desired token amounts
//! into a concrete tick range and liquidity amount.
//!
//! ## Strategies
//!
//! - **Full range** spans the nearest usable ticks to the protocol bounds.
//!   Used for a pool's first deposit.
//! - **Single sided** places a narrow range strictly on one side of the
//!   current tick, emulating a limit order. A range that would contain the
//!   current tick is rejected: it would silently become a two-sided position.
//! - **Target band** brackets a target price by `±band`, flooring both bounds.
//! - **Custom** takes caller-chosen ticks after validation.
//!
//! Prices passed to the builder are raw pool ratios (token1 smallest units per
//! token0 smallest unit). Use [`crate::tick_math::adjust_price_for_decimals`]
//! to convert human prices first.

use crate::error::{AmmError, Result};
use crate::fee_tier::FeeTier;
use crate::liquidity_math::{get_amounts_for_liquidity, get_liquidity_for_amounts};
use crate::tick_math::{
    floor_to_spacing, get_sqrt_ratio_at_tick, max_usable_tick, min_usable_tick, price_to_tick,
    MAX_TICK, MIN_TICK,
};
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which side of the current tick a single-sided range is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Strictly above the current tick; funded with token0 only and filled
    /// as the price rises
    Above,
    /// At or below the current tick; funded with token1 only and filled as
    /// the price falls
    Below,
}

/// Placement strategy for a new position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionKind {
    FullRange,
    SingleSided(Side),
    /// `target_price` is a raw pool ratio; `band` is a fraction in (0, 1)
    TargetBand { target_price: f64, band: f64 },
    Custom(i32, i32),
}

/// Half-open tick range `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    /// Validated range: ordered, aligned to `spacing`, inside the tick bounds
    pub fn new(lower: i32, upper: i32, spacing: i32) -> Result<Self> {
        if spacing <= 0 {
            return Err(AmmError::InvalidParameter {
                name: "tick_spacing",
                reason: format!("{} is not positive", spacing),
            });
        }
        if lower >= upper {
            return Err(AmmError::InvertedRange { lower, upper });
        }
        for tick in [lower, upper] {
            if tick < MIN_TICK || tick > MAX_TICK {
                return Err(AmmError::TickOutOfBounds {
                    tick: tick as i64,
                    min: MIN_TICK,
                    max: MAX_TICK,
                });
            }
            if tick % spacing != 0 {
                return Err(AmmError::MisalignedTick { tick, spacing });
            }
        }
        Ok(Self { lower, upper })
    }

    /// True when the pool's current tick is inside the range, i.e. the
    /// position would be funded with both tokens
    pub fn straddles(&self, current_tick: i32) -> bool {
        self.lower <= current_tick && current_tick < self.upper
    }

    pub fn sqrt_ratios(&self) -> Result<(U256, U256)> {
        Ok((
            get_sqrt_ratio_at_tick(self.lower)?,
            get_sqrt_ratio_at_tick(self.upper)?,
        ))
    }
}

/// Current pool price as needed by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceContext {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// A fully resolved deposit: range, liquidity, and the token amounts that
/// liquidity requires at the current price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub range: TickRange,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

/// Check that `range` sits entirely on `side` of `current_tick`
pub fn ensure_single_sided(range: TickRange, current_tick: i32, side: Side) -> Result<()> {
    let on_side = match side {
        Side::Above => range.lower > current_tick,
        Side::Below => range.upper <= current_tick,
    };
    if range.straddles(current_tick) || !on_side {
        return Err(AmmError::RangeStraddlesCurrentTick {
            lower: range.lower,
            upper: range.upper,
            current_tick,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct PositionBuilder {
    fee_tier: FeeTier,
    /// Single-sided range width, in multiples of the tick spacing
    single_sided_width: u32,
}

impl PositionBuilder {
    pub fn new(fee_tier: FeeTier, single_sided_width: u32) -> Result<Self> {
        if single_sided_width == 0 {
            return Err(AmmError::InvalidParameter {
                name: "single_sided_width",
                reason: "must be at least one tick spacing".to_string(),
            });
        }
        Ok(Self {
            fee_tier,
            single_sided_width,
        })
    }

    pub fn fee_tier(&self) -> FeeTier {
        self.fee_tier
    }

    pub fn full_range(&self) -> TickRange {
        let spacing = self.fee_tier.tick_spacing();
        TickRange {
            lower: min_usable_tick(spacing),
            upper: max_usable_tick(spacing),
        }
    }

    pub fn single_sided(&self, side: Side, current_tick: i32) -> Result<TickRange> {
        let spacing = self.fee_tier.tick_spacing();
        let width = (self.single_sided_width as i64 * spacing as i64).min(MAX_TICK as i64) as i32;
        let aligned = floor_to_spacing(current_tick, spacing);

        let (lower, upper) = match side {
            Side::Above => (aligned + spacing, aligned + spacing + width),
            Side::Below => (aligned - width, aligned),
        };

        let range = TickRange::new(lower, upper, spacing)?;
        ensure_single_sided(range, current_tick, side)?;
        Ok(range)
    }

    pub fn target_band(&self, target_price: f64, band: f64) -> Result<TickRange> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(AmmError::InvalidPrice {
                price: target_price,
            });
        }
        if !band.is_finite() || band <= 0.0 || band >= 1.0 {
            return Err(AmmError::InvalidParameter {
                name: "band",
                reason: format!("{} is not in (0, 1)", band),
            });
        }
        let spacing = self.fee_tier.tick_spacing();
        let lower = floor_to_spacing(price_to_tick(target_price * (1.0 - band))?, spacing);
        let upper = floor_to_spacing(price_to_tick(target_price * (1.0 + band))?, spacing);
        TickRange::new(lower, upper, spacing)
    }

    pub fn range_for(&self, kind: PositionKind, current_tick: i32) -> Result<TickRange> {
        match kind {
            PositionKind::FullRange => Ok(self.full_range()),
            PositionKind::SingleSided(side) => self.single_sided(side, current_tick),
            PositionKind::TargetBand { target_price, band } => self.target_band(target_price, band),
            PositionKind::Custom(lower, upper) => {
                TickRange::new(lower, upper, self.fee_tier.tick_spacing())
            }
        }
    }

    /// Range for kinds that do not depend on the current price. Single-sided
    /// ranges are placed relative to the current tick and resolve to `None`.
    pub fn fixed_range(&self, kind: PositionKind) -> Result<Option<TickRange>> {
        match kind {
            PositionKind::SingleSided(_) => Ok(None),
            other => self.range_for(other, 0).map(Some),
        }
    }

    /// Resolve `kind` against the current price and size it from the desired
    /// amounts. The returned amounts never exceed the desired ones.
    pub fn plan(
        &self,
        kind: PositionKind,
        price: PriceContext,
        amount0_desired: U256,
        amount1_desired: U256,
    ) -> Result<PositionPlan> {
        if amount0_desired.is_zero() && amount1_desired.is_zero() {
            return Err(AmmError::ZeroAmount {
                context: "both desired amounts are zero".to_string(),
            });
        }

        let range = self.range_for(kind, price.tick)?;
        let (sqrt_lower, sqrt_upper) = range.sqrt_ratios()?;
        let liquidity = get_liquidity_for_amounts(
            price.sqrt_price_x96,
            sqrt_lower,
            sqrt_upper,
            amount0_desired,
            amount1_desired,
        )?;
        if liquidity == 0 {
            return Err(AmmError::ZeroAmount {
                context: format!(
                    "desired amounts fund no liquidity in [{}, {}) at tick {}",
                    range.lower, range.upper, price.tick
                ),
            });
        }

        // Rounded up as the pool charges, never above what the caller offered
        let (amount0, amount1) =
            get_amounts_for_liquidity(price.sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity, true)?;
        let amount0 = amount0.min(amount0_desired);
        let amount1 = amount1.min(amount1_desired);

        debug!(
            lower = range.lower,
            upper = range.upper,
            liquidity,
            %amount0,
            %amount1,
            "Planned position"
        );

        Ok(PositionPlan {
            range,
            liquidity,
            amount0,
            amount1,
        })
    }
}

/// Token amounts a position's liquidity is worth at the current price,
/// rounded down as the pool pays out on decrease
pub fn amounts_for_position(
    range: TickRange,
    sqrt_price_x96: U256,
    liquidity: u128,
) -> Result<(U256, U256)> {
    let (sqrt_lower, sqrt_upper) = range.sqrt_ratios()?;
    get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity, false)
}

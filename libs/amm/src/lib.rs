//! # LP AMM Library - Concentrated Liquidity Mathematics
//!
//! ## Purpose
//!
//! Pure, I/O-free math for driving a tick-based concentrated-liquidity AMM:
//! price/tick/sqrtPriceX96 conversions, the protocol's liquidity amount
//! formulas, position range placement and slippage minimums. Everything the
//! liquidity engine submits on-chain is derived here first, so the results
//! must match the deployed contracts exactly.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool slot0 state from the engine's pool reader,
//!   desired deposit amounts and placement strategy from callers
//! - **Output Destinations**: Mint/decrease calldata builders, swap minimums,
//!   pool initialization price
//! - **Protocol Support**: Uniswap V3 and forks sharing its tick math
//!
//! ## Architecture Role
//!
//! ```text
//! Human Price ──→ [tick_math] ──→ tick / sqrtPriceX96 ──→ Pool Initializer
//!                      │
//! Strategy + Amounts ─→ [position] ──→ TickRange + Liquidity ──→ Mint
//!                      │
//!                 [liquidity_math]  (exact 512-bit intermediates)
//!                      │
//! Quote ──────────→ [slippage] / [swap_math] ──→ minimum out, impact, fee
//! ```
//!
//! ## Precision
//!
//! Float math is confined to converting human prices into ticks and starting
//! prices. Liquidity and amounts use exact integer math on 256/512-bit
//! integers, mirroring `TickMath`, `SqrtPriceMath` and `LiquidityAmounts`.

pub mod error;
pub mod fee_tier;
pub mod liquidity_math;
pub mod position;
pub mod slippage;
pub mod swap_math;
pub mod tick_math;

pub use error::{AmmError, Result};
pub use fee_tier::FeeTier;
pub use position::{
    amounts_for_position, ensure_single_sided, PositionBuilder, PositionKind, PositionPlan,
    PriceContext, Side, TickRange,
};
pub use slippage::SlippageTolerance;
pub use tick_math::{
    get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, price_to_sqrt_price_x96, price_to_tick,
    safe_sqrt_price_x96, safe_tick, sqrt_price_x96_to_price, tick_to_price, MAX_SQRT_RATIO,
    MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q96,
};

/// Common numeric types
pub use ethereum_types::U256;
pub use rust_decimal::Decimal;
